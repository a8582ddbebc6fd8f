//! printf-style frame number patterns such as `left/%06d.png`

use std::path::PathBuf;

use crate::error::{IoError, Result};

/// Filename pattern with exactly one integer placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePattern {
    prefix: String,
    suffix: String,
    width: usize,
    zero_pad: bool,
}

impl FramePattern {
    /// Parse a pattern containing one `%d`, `%Nd` or `%0Nd`. `%%` is a literal `%`.
    pub fn parse(pattern: &str) -> Result<Self> {
        let err = |reason: &str| IoError::Pattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut placeholder: Option<(usize, bool)> = None;
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            let out = if placeholder.is_some() { &mut suffix } else { &mut prefix };
            if c != '%' {
                out.push(c);
                continue;
            }
            if chars.peek() == Some(&'%') {
                chars.next();
                out.push('%');
                continue;
            }
            if placeholder.is_some() {
                return Err(err("more than one placeholder"));
            }

            let zero_pad = chars.next_if_eq(&'0').is_some();
            let mut digits = String::new();
            while let Some(d) = chars.next_if(|ch| ch.is_ascii_digit()) {
                digits.push(d);
            }
            match chars.next() {
                Some('d') | Some('i') | Some('u') => {}
                Some(other) => return Err(err(&format!("unsupported conversion %{other}"))),
                None => return Err(err("unterminated placeholder")),
            }
            let width = if digits.is_empty() {
                0
            } else {
                digits.parse().map_err(|_| err("invalid field width"))?
            };
            placeholder = Some((width, zero_pad));
        }

        let (width, zero_pad) = placeholder.ok_or_else(|| err("no frame number placeholder"))?;
        Ok(Self {
            prefix,
            suffix,
            width,
            zero_pad,
        })
    }

    pub fn format(&self, frame: u32) -> String {
        let number = if self.zero_pad {
            format!("{frame:0width$}", width = self.width)
        } else {
            format!("{frame:>width$}", width = self.width)
        };
        format!("{}{}{}", self.prefix, number, self.suffix)
    }

    pub fn path(&self, frame: u32) -> PathBuf {
        PathBuf::from(self.format(frame))
    }
}

impl std::str::FromStr for FramePattern {
    type Err = IoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
