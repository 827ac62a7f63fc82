/*!
# Edit Buffer

Pending range → replacement edits over one immutable source buffer.

Recorded ranges are kept pairwise disjoint: replacing a range absorbs every
edit nested inside it (its text was already composed into the replacement),
and any other overlap is rejected.
*/

use std::collections::BTreeMap;

use crate::source::SourceRange;
use crate::{Result, RewriteError};

/// Replacement text keyed by the original range it stands for
#[derive(Debug)]
pub struct EditBuffer<'s> {
    source: &'s str,
    edits: BTreeMap<SourceRange, String>,
}

impl<'s> EditBuffer<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            edits: BTreeMap::new(),
        }
    }

    /// Record that the output for `range` is `text`
    pub fn replace(&mut self, range: SourceRange, text: impl Into<String>) -> Result<()> {
        self.check_range(range)?;

        let mut absorbed = Vec::new();
        for existing in self.overlapping(range) {
            if range.contains(&existing) && range != existing {
                absorbed.push(existing);
            } else {
                return Err(RewriteError::OverlappingEdit {
                    requested: range,
                    existing,
                });
            }
        }
        for nested in absorbed {
            self.edits.remove(&nested);
        }

        self.edits.insert(range, text.into());
        Ok(())
    }

    /// Current text for `range`, with nested edits applied
    pub fn text_for(&self, range: SourceRange) -> Result<String> {
        if let Some(text) = self.edits.get(&range) {
            return Ok(text.clone());
        }
        self.check_range(range)?;
        self.splice(range)
    }

    /// Produce the complete output text
    pub fn finalize(&self) -> Result<String> {
        self.splice(SourceRange::new(0, self.source.len()))
    }

    /// Recorded edits in range order
    pub fn edits(&self) -> impl Iterator<Item = (SourceRange, &str)> + '_ {
        self.edits.iter().map(|(range, text)| (*range, text.as_str()))
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    fn splice(&self, range: SourceRange) -> Result<String> {
        // text_for only ever asks about whole nodes, so a straddling edit
        // means the caller broke the nesting discipline
        if let Some(existing) = self.overlapping(range).into_iter().find(|r| !range.contains(r)) {
            return Err(RewriteError::OverlappingEdit {
                requested: range,
                existing,
            });
        }

        let mut out = String::with_capacity(range.len());
        let mut cursor = range.begin;

        for (edit_range, text) in self.edits.range(SourceRange::new(range.begin, range.begin)..) {
            if edit_range.begin >= range.end {
                break;
            }
            out.push_str(self.slice(SourceRange::new(cursor, edit_range.begin))?);
            out.push_str(text);
            cursor = edit_range.end;
        }

        out.push_str(self.slice(SourceRange::new(cursor, range.end))?);
        Ok(out)
    }

    fn overlapping(&self, range: SourceRange) -> Vec<SourceRange> {
        // Disjoint edits sorted by begin also have sorted ends, so only the
        // edit just before `range.begin` can reach into it from the left.
        let before = self
            .edits
            .range(..SourceRange::new(range.begin, range.begin))
            .next_back()
            .map(|(r, _)| *r);
        let from = self
            .edits
            .range(SourceRange::new(range.begin, range.begin)..)
            .map(|(r, _)| *r)
            .take_while(|r| r.begin < range.end || (r.is_empty() && r.begin == range.begin));

        before
            .into_iter()
            .chain(from)
            .filter(|r| r.overlaps(&range) || r == &range)
            .collect()
    }

    fn slice(&self, range: SourceRange) -> Result<&'s str> {
        range.slice(self.source).ok_or(RewriteError::InvalidRange {
            range,
            len: self.source.len(),
        })
    }

    fn check_range(&self, range: SourceRange) -> Result<()> {
        self.slice(range).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_text_for_unedited_range_is_original() -> anyhow::Result<()> {
        let buffer = EditBuffer::new("a + b;");
        assert_eq!(buffer.text_for(SourceRange::new(0, 5))?, "a + b");
        assert!(buffer.is_empty());
        Ok(())
    }

    #[test]
    fn test_replace_then_text_for_exact_range() -> anyhow::Result<()> {
        let mut buffer = EditBuffer::new("x = a + b;");
        buffer.replace(SourceRange::new(4, 9), "complex_add(a,b)")?;
        assert_eq!(buffer.text_for(SourceRange::new(4, 9))?, "complex_add(a,b)");
        assert_eq!(buffer.finalize()?, "x = complex_add(a,b);");
        Ok(())
    }

    #[test]
    fn test_text_for_enclosing_range_splices_nested_edits() -> anyhow::Result<()> {
        let mut buffer = EditBuffer::new("(a + b) * c");
        buffer.replace(SourceRange::new(1, 6), "complex_add(a,b)")?;
        assert_eq!(buffer.text_for(SourceRange::new(0, 7))?, "(complex_add(a,b))");
        Ok(())
    }

    #[test]
    fn test_replacing_parent_absorbs_children() -> anyhow::Result<()> {
        let mut buffer = EditBuffer::new("a + b/c");
        buffer.replace(SourceRange::new(4, 7), "complex_div(b,c)")?;
        buffer.replace(SourceRange::new(0, 7), "complex_add(a,complex_div(b,c))")?;

        let edits: Vec<_> = buffer.edits().collect();
        assert_eq!(
            edits,
            vec![(SourceRange::new(0, 7), "complex_add(a,complex_div(b,c))")]
        );
        assert_eq!(buffer.finalize()?, "complex_add(a,complex_div(b,c))");
        Ok(())
    }

    #[test]
    fn test_partial_overlap_is_rejected() {
        let mut buffer = EditBuffer::new("abcdefgh");
        buffer.replace(SourceRange::new(2, 5), "X").unwrap();

        let err = buffer.replace(SourceRange::new(4, 7), "Y").unwrap_err();
        assert!(matches!(
            err,
            RewriteError::OverlappingEdit { existing, .. } if existing == SourceRange::new(2, 5)
        ));

        // an existing edit enclosing the new one is also a conflict
        let err = buffer.replace(SourceRange::new(3, 4), "Z").unwrap_err();
        assert!(matches!(err, RewriteError::OverlappingEdit { .. }));

        // so is editing the same range twice
        let err = buffer.replace(SourceRange::new(2, 5), "W").unwrap_err();
        assert!(matches!(err, RewriteError::OverlappingEdit { .. }));
    }

    #[test]
    fn test_adjacent_edits_do_not_conflict() -> anyhow::Result<()> {
        let mut buffer = EditBuffer::new("aabb");
        buffer.replace(SourceRange::new(0, 2), "1")?;
        buffer.replace(SourceRange::new(2, 4), "2")?;
        assert_eq!(buffer.finalize()?, "12");
        Ok(())
    }

    #[test]
    fn test_out_of_bounds_range_is_reported() {
        let mut buffer = EditBuffer::new("abc");
        let err = buffer.replace(SourceRange::new(1, 9), "x").unwrap_err();
        assert!(matches!(err, RewriteError::InvalidRange { len: 3, .. }));
        assert!(buffer.text_for(SourceRange::new(5, 6)).is_err());
    }

    #[test]
    fn test_finalize_preserves_untouched_bytes() -> anyhow::Result<()> {
        let source = "// keep me\nz = a*b; /* and me */\n";
        let mut buffer = EditBuffer::new(source);
        buffer.replace(SourceRange::new(15, 18), "complex_mul(a,b)")?;
        assert_eq!(
            buffer.finalize()?,
            "// keep me\nz = complex_mul(a,b); /* and me */\n"
        );
        Ok(())
    }
}
