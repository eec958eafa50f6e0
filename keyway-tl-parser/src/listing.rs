//! Iterator behind [`crate::parse_listing`].

use crate::errors::ParseError;
use crate::schema::{Kind, TypeSchema};

pub(crate) struct Listing<'a> {
    lines: std::str::Lines<'a>,
    kind: Kind,
    /// Text of a definition that has not reached its `;` yet.
    pending: String,
}

impl<'a> Listing<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Self { lines: src.lines(), kind: Kind::Constructor, pending: String::new() }
    }

    fn switch_section(&mut self, line: &str) -> bool {
        match line {
            "--functions--" | "---functions---" => self.kind = Kind::Function,
            "--types--" | "---types---" => self.kind = Kind::Constructor,
            _ => return false,
        }
        true
    }
}

impl Iterator for Listing<'_> {
    type Item = Result<TypeSchema, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some(line) = self.lines.next() else {
                // Unterminated trailing definition
                let rest = std::mem::take(&mut self.pending);
                return (!rest.trim().is_empty()).then(|| parse(&rest, self.kind));
            };

            let line = match line.find("//") {
                Some(at) => &line[..at],
                None => line,
            };
            let line = line.trim();
            if line.is_empty() || self.switch_section(line) {
                continue;
            }

            self.pending.push(' ');
            self.pending.push_str(line);
            if !line.ends_with(';') {
                continue;
            }

            let raw = std::mem::take(&mut self.pending);
            return Some(parse(&raw, self.kind));
        }
    }
}

fn parse(raw: &str, kind: Kind) -> Result<TypeSchema, ParseError> {
    raw.parse::<TypeSchema>().map(|mut s| {
        s.kind = kind;
        s
    })
}
