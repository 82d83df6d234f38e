use std::fmt;

/// Formats a slice as a markdown-style list, one entry per line.
///
/// Surface negotiation logs every supported format and present mode, which
/// reads much better in the wrapped multi-line log format than a single
/// `{:?}` of the slice.
pub struct PrettyList<'data, T>(pub &'data [T]);

impl<'data, T> PrettyList<'data, T> {
    fn write_entries(
        &self,
        f: &mut fmt::Formatter<'_>,
        entry: impl Fn(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
    ) -> fmt::Result {
        f.write_str("\n")?;
        for item in self.0 {
            f.write_str("- ")?;
            entry(f, item)?;
            f.write_str("\n")?;
        }
        Ok(())
    }
}

impl<'data, T: fmt::Debug> fmt::Debug for PrettyList<'data, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alternate = f.alternate();
        self.write_entries(f, |f, item| {
            if alternate {
                write!(f, "{:#?}", item)
            } else {
                write!(f, "{:?}", item)
            }
        })
    }
}

impl<'data, T: fmt::Display> fmt::Display for PrettyList<'data, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_entries(f, |f, item| write!(f, "{}", item))
    }
}
