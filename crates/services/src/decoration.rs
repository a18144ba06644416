//! # Decoration Engine
//!
//! The random-decoration topic wraps every line of a post in one
//! independently drawn HTML wrapper from a fixed catalog. Wrappers with an
//! attribute-variant list get one uniformly drawn variant substituted into
//! the open tag. No wrapper choice is shared between lines.

use rand::prelude::IndexedRandom;
use rand::Rng;

/// One catalog entry. `open` may contain a `{}` placeholder that a drawn
/// variant is substituted into.
struct Wrapper {
    open: &'static str,
    close: &'static str,
    variants: &'static [&'static str],
}

const NO_VARIANTS: &[&str] = &[];

const CATALOG: [Wrapper; 18] = [
    Wrapper { open: "", close: "", variants: NO_VARIANTS }, // leave the line alone
    Wrapper { open: "<h1>", close: "</h1>", variants: NO_VARIANTS },
    Wrapper { open: "<h2>", close: "</h2>", variants: NO_VARIANTS },
    Wrapper { open: "<h3>", close: "</h3>", variants: NO_VARIANTS },
    Wrapper { open: "<h4>", close: "</h4>", variants: NO_VARIANTS },
    Wrapper { open: "<h5>", close: "</h5>", variants: NO_VARIANTS },
    Wrapper { open: "<h6>", close: "</h6>", variants: NO_VARIANTS },
    Wrapper { open: "<b>", close: "</b>", variants: NO_VARIANTS },
    Wrapper { open: "<i>", close: "</i>", variants: NO_VARIANTS },
    Wrapper { open: "<s>", close: "</s>", variants: NO_VARIANTS },
    Wrapper { open: "<em>", close: "</em>", variants: NO_VARIANTS },
    Wrapper { open: "<mark>", close: "</mark>", variants: NO_VARIANTS },
    Wrapper { open: "<code>", close: "</code>", variants: NO_VARIANTS },
    Wrapper { open: "<small>", close: "</small>", variants: NO_VARIANTS },
    Wrapper {
        open: "<marquee direction=\"{}\">",
        close: "</marquee>",
        variants: &["left", "right", "up", "down"],
    },
    Wrapper {
        open: "<font size=\"{}\">",
        close: "</font>",
        variants: &["1", "2", "3", "4", "5", "6", "7"],
    },
    Wrapper {
        open: "<font face=\"{}\">",
        close: "</font>",
        variants: &["serif", "sans-serif", "monospace", "cursive", "fantasy"],
    },
    Wrapper {
        open: "<div align=\"{}\">",
        close: "</div>",
        variants: &["left", "center", "right"],
    },
];

/// Wraps each line of `text` in a randomly drawn catalog entry.
pub fn decorate<R: Rng + ?Sized>(text: &str, rng: &mut R) -> String {
    text.lines()
        .map(|line| decorate_line(line, rng))
        .collect::<Vec<_>>()
        .join("\n")
}

fn decorate_line<R: Rng + ?Sized>(line: &str, rng: &mut R) -> String {
    if line.is_empty() {
        return String::new();
    }
    let wrapper = &CATALOG[rng.random_range(0..CATALOG.len())];
    let open = match wrapper.variants.choose(rng) {
        Some(variant) => wrapper.open.replace("{}", variant),
        None => wrapper.open.to_string(),
    };
    format!("{open}{line}{}", wrapper.close)
}
