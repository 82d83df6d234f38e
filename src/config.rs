//! Frame scheduler settings.
//!
//! Settings can be built in code or loaded from a TOML document. Every field
//! is optional in TOML and falls back to its default:
//!
//! ```toml
//! buffering_depth = 3
//! preferred_format = "B8G8R8A8_SRGB"
//! preferred_color_space = "SRGB_NONLINEAR"
//! fence_timeout_ms = 1000
//!
//! [initial_extent]
//! width = 1280
//! height = 720
//! ```

use {
    ash::vk,
    serde::{Deserialize, Serialize},
    std::{path::Path, time::Duration},
    thiserror::Error,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to read config file {path:?}")]
    UnableToRead {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to parse frame config")]
    UnableToParse(#[from] toml::de::Error),

    #[error("The buffering depth must be at least 1")]
    ZeroBufferingDepth,

    #[error("The initial extent {width}x{height} has zero area")]
    ZeroAreaExtent { width: u32, height: u32 },
}

/// Swapchain image formats which can be named in a config file.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum ColorFormat {
    #[serde(rename = "B8G8R8A8_SRGB")]
    Bgra8Srgb,

    #[serde(rename = "R8G8B8A8_SRGB")]
    Rgba8Srgb,

    #[serde(rename = "B8G8R8A8_UNORM")]
    Bgra8Unorm,

    #[serde(rename = "R8G8B8A8_UNORM")]
    Rgba8Unorm,
}

impl ColorFormat {
    pub fn as_vk(self) -> vk::Format {
        match self {
            Self::Bgra8Srgb => vk::Format::B8G8R8A8_SRGB,
            Self::Rgba8Srgb => vk::Format::R8G8B8A8_SRGB,
            Self::Bgra8Unorm => vk::Format::B8G8R8A8_UNORM,
            Self::Rgba8Unorm => vk::Format::R8G8B8A8_UNORM,
        }
    }
}

/// Swapchain color spaces which can be named in a config file.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum ColorSpace {
    #[serde(rename = "SRGB_NONLINEAR")]
    SrgbNonlinear,

    #[serde(rename = "EXTENDED_SRGB_LINEAR")]
    ExtendedSrgbLinear,

    #[serde(rename = "HDR10_ST2084")]
    Hdr10St2084,
}

impl ColorSpace {
    pub fn as_vk(self) -> vk::ColorSpaceKHR {
        match self {
            Self::SrgbNonlinear => vk::ColorSpaceKHR::SRGB_NONLINEAR,
            Self::ExtendedSrgbLinear => {
                vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT
            }
            Self::Hdr10St2084 => vk::ColorSpaceKHR::HDR10_ST2084_EXT,
        }
    }
}

/// A logical window size in pixels.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

/// Immutable settings for a `FrameScheduler`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrameConfig {
    /// How many frames may be in flight at once. This is the image count
    /// requested from the surface, so the actual depth can be higher or
    /// lower depending on the surface limits.
    pub buffering_depth: u32,
    pub preferred_format: ColorFormat,
    pub preferred_color_space: ColorSpace,

    /// Only used when the surface lets the swapchain pick its own extent.
    pub initial_extent: Extent,

    /// Missing means wait forever.
    pub acquire_timeout_ms: Option<u64>,
    pub fence_timeout_ms: Option<u64>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            buffering_depth: 3,
            preferred_format: ColorFormat::Bgra8Srgb,
            preferred_color_space: ColorSpace::SrgbNonlinear,
            initial_extent: Extent {
                width: 1280,
                height: 720,
            },
            acquire_timeout_ms: None,
            fence_timeout_ms: None,
        }
    }
}

impl FrameConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: FrameConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path. A missing file yields the
    /// defaults.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| {
            ConfigError::UnableToRead {
                path: path.to_owned(),
                source,
            }
        })?;
        let config = Self::from_toml_str(&content)?;
        log::info!("Loaded frame configuration from {:?}", path);
        log::debug!("{:#?}", config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffering_depth == 0 {
            return Err(ConfigError::ZeroBufferingDepth);
        }
        let Extent { width, height } = self.initial_extent;
        if width == 0 || height == 0 {
            return Err(ConfigError::ZeroAreaExtent { width, height });
        }
        Ok(())
    }

    pub fn preferred_surface_format(&self) -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR {
            format: self.preferred_format.as_vk(),
            color_space: self.preferred_color_space.as_vk(),
        }
    }

    pub fn initial_extent(&self) -> vk::Extent2D {
        vk::Extent2D {
            width: self.initial_extent.width,
            height: self.initial_extent.height,
        }
    }

    pub fn acquire_timeout(&self) -> Option<Duration> {
        self.acquire_timeout_ms.map(Duration::from_millis)
    }

    pub fn fence_timeout(&self) -> Option<Duration> {
        self.fence_timeout_ms.map(Duration::from_millis)
    }
}
