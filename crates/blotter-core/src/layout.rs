use crate::extraction::PageContent;
use crate::model::{Line, Token};

/// Groups a page's word tokens into text rows by vertical proximity.
#[derive(Debug, Clone, Copy)]
pub struct LineAssembler {
    tolerance: f32,
}

impl LineAssembler {
    pub fn new(tolerance: f32) -> Self {
        LineAssembler { tolerance }
    }

    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    /// Assemble the lines of a page.
    ///
    /// Pages without word tokens fall back to their plain text, one line per
    /// text row, all at position 0.
    pub fn assemble(&self, page: &PageContent) -> Vec<Line> {
        if !page.tokens.is_empty() {
            return self.assemble_tokens(&page.tokens);
        }

        page.fallback_text
            .lines()
            .map(|l| Line {
                text: l.to_string(),
                top: 0.0,
            })
            .collect()
    }

    /// Cluster tokens into lines.
    ///
    /// A token joins the current row while its `top` is within the tolerance
    /// of the top of the token that opened the row. Tokens are taken in the
    /// order given; they are not re-sorted.
    pub fn assemble_tokens(&self, tokens: &[Token]) -> Vec<Line> {
        let mut lines = Vec::new();
        let mut iter = tokens.iter();

        let Some(first) = iter.next() else {
            return lines;
        };
        let mut cur_top = first.top;
        let mut bucket: Vec<&str> = vec![first.text.as_str()];

        for token in iter {
            if (token.top - cur_top).abs() <= self.tolerance {
                bucket.push(&token.text);
            } else {
                lines.push(flush(&bucket, cur_top));
                bucket.clear();
                bucket.push(&token.text);
                cur_top = token.top;
            }
        }
        lines.push(flush(&bucket, cur_top));

        lines
    }
}

impl Default for LineAssembler {
    fn default() -> Self {
        LineAssembler::new(3.0)
    }
}

fn flush(bucket: &[&str], top: f32) -> Line {
    Line {
        text: bucket.join(" ").trim().to_string(),
        top,
    }
}
