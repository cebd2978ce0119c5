//! CSV header renaming.
//!
//! Stats exports use camelCase with `_`-joined nesting
//! (`teamStats_fourFactors_turnoverRatio`). Columns land in the datastore as
//! snake_case, with the `teamStats_` / `opponentStats_` prefixes shortened.

const PREFIXES: &[(&str, &str)] = &[("teamStats_", "team_"), ("opponentStats_", "opponent_")];

/// How a job maps source headers to column names.
#[derive(Debug, Clone, Copy)]
pub struct ColumnRenamer {
    /// Exact header -> column overrides, checked first.
    pub overrides: &'static [(&'static str, &'static str)],
    /// Apply the generic snake_case rule to headers without an override.
    pub snake_case: bool,
}

impl ColumnRenamer {
    pub const IDENTITY: Self = Self {
        overrides: &[],
        snake_case: false,
    };

    pub const SNAKE_CASE: Self = Self {
        overrides: &[],
        snake_case: true,
    };

    pub fn rename(&self, header: &str) -> String {
        let header = header.trim();
        if let Some((_, to)) = self.overrides.iter().find(|(from, _)| *from == header) {
            return (*to).to_string();
        }
        if self.snake_case {
            stats_column_name(header)
        } else {
            header.to_string()
        }
    }
}

/// Generic rule: shorten the stats prefixes, then snake_case the rest.
pub fn stats_column_name(header: &str) -> String {
    for (from, to) in PREFIXES {
        if let Some(rest) = header.strip_prefix(from) {
            return format!("{to}{}", to_snake_case(rest));
        }
    }
    to_snake_case(header)
}

/// camelCase -> snake_case. Digit runs become their own segment
/// (`totalPer40` -> `total_per_40`) and all-caps words are lower-cased whole
/// (`PORPAG` -> `porpag`).
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        let prev = i.checked_sub(1).map(|p| chars[p]);
        let next = chars.get(i + 1).copied();

        let boundary = match prev {
            None | Some('_') => false,
            Some(p) if c.is_ascii_uppercase() => {
                p.is_ascii_lowercase()
                    || p.is_ascii_digit()
                    || (p.is_ascii_uppercase() && next.is_some_and(|n| n.is_ascii_lowercase()))
            }
            Some(p) if c.is_ascii_digit() => !p.is_ascii_digit(),
            _ => false,
        };

        if boundary && !out.ends_with('_') {
            out.push('_');
        }
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c.to_ascii_lowercase());
    }

    out
}
