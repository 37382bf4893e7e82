/// Compiles a CSS selector once and hands out a `&'static` reference to it.
#[macro_export]
macro_rules! selector {
    ($e: expr) => {{
        use ::once_cell::sync::Lazy;
        use ::scraper::Selector;
        static SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse($e).unwrap());
        &*SELECTOR
    }};
}

/// Compiles a regex once and hands out a `&'static` reference to it.
///
/// The pattern may be any expression that derefs to `str`,
/// so patterns assembled at runtime (e.g. from an enum's variants) work too.
/// The expression is evaluated only on first use.
#[macro_export]
macro_rules! regex {
    ($e: expr) => {{
        use ::once_cell::sync::Lazy;
        use ::regex::Regex;
        static PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(&$e).unwrap());
        &*PATTERN
    }};
}
