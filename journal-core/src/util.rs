use std::fmt::{self, Display, Write};
use time::{Date, PrimitiveDateTime, Time};

pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// Longest prefix of `value` not exceeding `max` bytes that ends on a char boundary.
pub fn truncate_str(value: &str, max: usize) -> &str {
    if value.len() <= max {
        return value;
    }
    let mut end = max;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

pub fn write_date(out: &mut String, value: &Date) {
    let _ = write!(
        out,
        "{:04}-{:02}-{:02}",
        value.year(),
        value.month() as u8,
        value.day()
    );
}

/// Writes `hh:mm:ss`, followed by the fractional seconds only when not zero.
pub fn write_time(out: &mut String, value: &Time) {
    let _ = write!(
        out,
        "{:02}:{:02}:{:02}",
        value.hour(),
        value.minute(),
        value.second()
    );
    let mut subsecond = value.nanosecond();
    if subsecond == 0 {
        return;
    }
    let mut width = 9;
    while subsecond % 10 == 0 {
        subsecond /= 10;
        width -= 1;
    }
    let _ = write!(out, ".{:0width$}", subsecond);
}

pub fn write_timestamp(out: &mut String, value: &PrimitiveDateTime, separator: char) {
    write_date(out, &value.date());
    out.push(separator);
    write_time(out, &value.time());
}

/// Timestamp text in the `YYYY-MM-DD hh:mm:ss[.fff]` form produced by `CURRENT_TIMESTAMP`.
pub fn format_timestamp(value: &PrimitiveDateTime) -> String {
    let mut out = String::with_capacity(32);
    write_timestamp(&mut out, value, ' ');
    out
}

#[macro_export]
macro_rules! possibly_parenthesized {
    ($out:ident, $cond:expr, $v:expr) => {
        if $cond {
            $out.push('(');
            $v;
            $out.push(')');
        } else {
            $v;
        }
    };
}

/// Display adapter printing at most about 500 bytes of a query or value.
pub struct Truncated<'a>(pub &'a str);

impl Display for Truncated<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let truncated = truncate_str(self.0, 497);
        f.write_str(truncated.trim_end())?;
        if truncated.len() < self.0.len() {
            f.write_str("...")?;
        }
        Ok(())
    }
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        $crate::Truncated(::std::convert::AsRef::<str>::as_ref(&$query))
    };
}
