use once_cell::sync::Lazy;
use regex::Regex;

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern"));
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*?)\*").expect("italic pattern"));
static UNDERLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"__(.*?)__").expect("underline pattern"));

/// Opening and closing text emitted for each style.
pub struct Styles {
    pub bold: (&'static str, &'static str),
    pub italic: (&'static str, &'static str),
    pub underline: (&'static str, &'static str),
}

pub const HTML: Styles = Styles {
    bold: ("<strong>", "</strong>"),
    italic: ("<em>", "</em>"),
    underline: ("<u>", "</u>"),
};

pub const ANSI: Styles = Styles {
    bold: ("\x1b[1m", "\x1b[22m"),
    italic: ("\x1b[3m", "\x1b[23m"),
    underline: ("\x1b[4m", "\x1b[24m"),
};

/// Bold, then italic, then underline. Matches are non-greedy and stay on one line.
pub fn expand_with(text: &str, styles: &Styles) -> String {
    let wrap = |(open, close): (&str, &str)| format!("{}${{1}}{}", open, close);
    let out = BOLD.replace_all(text, wrap(styles.bold).as_str());
    let out = ITALIC.replace_all(&out, wrap(styles.italic).as_str());
    UNDERLINE.replace_all(&out, wrap(styles.underline).as_str()).into_owned()
}

pub fn expand(text: &str) -> String {
    expand_with(text, &HTML)
}

pub fn expand_ansi(text: &str) -> String {
    expand_with(text, &ANSI)
}
