//! # Content Validator
//!
//! Per-topic text rules. Dispatch is a single `match` over [`TopicKind`];
//! the topic table carries data only, never behavior. Every rule judges
//! sanitized plain text and counts characters, not bytes.

use domains::{LimitMode, PipelineError, PipelineResult, RandomLimitParams, TopicKind};
use rand::Rng;
use unicode_properties::{GeneralCategoryGroup, UnicodeEmoji, UnicodeGeneralCategory};
use unicode_script::{Script, UnicodeScript};

/// Characters the kanji-only rule accepts besides Han and emoji.
const KANJI_ALLOW_LIST: [char; 5] = ['！', '？', '…', '　', '\n'];

/// Required line lengths of a senryu, each tolerating ±1.
const SENRYU_TARGETS: [usize; 3] = [5, 7, 5];

const POLL_OPTION_MAX_CHARS: usize = 50;

/// Rolls the length bounds for a random-limit post. Called exactly once per
/// post; the result is thereafter an input to [`validate`], so a retried
/// request reproduces the same verdict.
pub fn generate_limit_params<R: Rng + ?Sized>(rng: &mut R) -> RandomLimitParams {
    match rng.random_range(0..3u8) {
        0 => RandomLimitParams {
            mode: LimitMode::Min,
            min: Some(rng.random_range(10..=140)),
            max: None,
        },
        1 => RandomLimitParams {
            mode: LimitMode::Max,
            min: None,
            max: Some(rng.random_range(5..=140)),
        },
        _ => {
            let a = rng.random_range(10..=140u32);
            let b = rng.random_range(5..=140u32);
            RandomLimitParams {
                mode: LimitMode::MinMax,
                min: Some(a.min(b)),
                max: Some(a.max(b)),
            }
        }
    }
}

/// Applies the active topic's rule to sanitized text.
///
/// `options` is only consulted for poll topics; `params` only for
/// random-limit topics (and must be present there).
pub fn validate(
    kind: TopicKind,
    text: &str,
    options: Option<&[String]>,
    params: Option<&RandomLimitParams>,
) -> PipelineResult<()> {
    if text.is_empty() && !kind.allows_empty_text() {
        return Err(PipelineError::Validation("text must not be empty".into()));
    }

    match kind {
        TopicKind::Normal | TopicKind::Anonymous | TopicKind::AiGenerated => Ok(()),
        TopicKind::RandomDecoration => Ok(()),
        TopicKind::ImageOnly | TopicKind::MovaPic => Ok(()),
        TopicKind::EnglishOnly => validate_english_only(text),
        TopicKind::KanjiOnly => validate_kanji_only(text),
        TopicKind::Senryu => validate_senryu(text),
        TopicKind::RandomLimit => {
            let params = params.ok_or_else(|| {
                PipelineError::Validation("length bounds were not issued for this post".into())
            })?;
            validate_random_limit(text, params)
        }
        TopicKind::Poll => validate_poll(options.unwrap_or(&[])),
    }
}

fn validate_english_only(text: &str) -> PipelineResult<()> {
    match text.chars().find(|&c| !is_english_character(c)) {
        None => Ok(()),
        Some(c) => Err(PipelineError::Validation(format!(
            "'{c}' is not allowed on the english-only topic"
        ))),
    }
}

fn is_english_character(c: char) -> bool {
    c.is_ascii()
        || c.script() == Script::Latin
        || matches!(
            c.general_category_group(),
            GeneralCategoryGroup::Punctuation | GeneralCategoryGroup::Symbol
        )
        || c.is_emoji_char()
}

fn validate_kanji_only(text: &str) -> PipelineResult<()> {
    match text.chars().find(|&c| !is_kanji_character(c)) {
        None => Ok(()),
        Some(c) => Err(PipelineError::Validation(format!(
            "'{c}' is not allowed on the kanji-only topic"
        ))),
    }
}

fn is_kanji_character(c: char) -> bool {
    c.script_extension().contains_script(Script::Han)
        || KANJI_ALLOW_LIST.contains(&c)
        || (c.is_emoji_char() && !c.is_ascii())
}

fn validate_senryu(text: &str) -> PipelineResult<()> {
    // Lines may be separated by newline or full-width space.
    let lines: Vec<&str> = text
        .split(['\n', '　'])
        .filter(|line| !line.is_empty())
        .collect();

    if lines.len() != SENRYU_TARGETS.len() {
        return Err(PipelineError::Validation(format!(
            "a senryu needs exactly 3 lines, got {}",
            lines.len()
        )));
    }

    for (line, target) in lines.iter().zip(SENRYU_TARGETS) {
        let len = line.chars().count();
        if len.abs_diff(target) > 1 {
            return Err(PipelineError::Validation(format!(
                "line \"{line}\" has {len} characters, expected {target}±1"
            )));
        }
    }
    Ok(())
}

fn validate_random_limit(text: &str, params: &RandomLimitParams) -> PipelineResult<()> {
    let len = text.chars().count() as u32;

    if let Some(min) = params.min {
        if len < min {
            return Err(PipelineError::Validation(format!(
                "need {} more characters (minimum {min})",
                min - len
            )));
        }
    }
    if let Some(max) = params.max {
        if len > max {
            return Err(PipelineError::Validation(format!(
                "remove {} characters (maximum {max})",
                len - max
            )));
        }
    }
    Ok(())
}

fn validate_poll(options: &[String]) -> PipelineResult<()> {
    for (i, option) in options.iter().enumerate() {
        if option.trim().is_empty() {
            return Err(PipelineError::Validation(format!(
                "poll option {} is empty",
                i + 1
            )));
        }
        if option.chars().count() > POLL_OPTION_MAX_CHARS {
            return Err(PipelineError::Validation(format!(
                "poll option {} exceeds {POLL_OPTION_MAX_CHARS} characters",
                i + 1
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ok(kind: TopicKind, text: &str) -> bool {
        validate(kind, text, None, None).is_ok()
    }

    #[test]
    fn english_only_accepts_ascii_latin_and_emoji() {
        assert!(ok(TopicKind::EnglishOnly, "Hello, world! Café #1 🎉"));
    }

    #[test]
    fn english_only_rejects_a_single_cjk_character() {
        assert!(!ok(TopicKind::EnglishOnly, "hello 猫 world"));
        assert!(!ok(TopicKind::EnglishOnly, "こんにちは"));
    }

    #[test]
    fn kanji_only_accepts_han_allow_list_and_emoji() {
        assert!(ok(TopicKind::KanjiOnly, "今日天気！？…　\n晴天🎉"));
    }

    #[test]
    fn kanji_only_rejects_kana_and_ascii() {
        assert!(!ok(TopicKind::KanjiOnly, "今日はれ"));
        assert!(!ok(TopicKind::KanjiOnly, "天気a"));
    }

    #[test]
    fn senryu_first_line_of_three_chars_fails() {
        // からす = 3 chars, outside {4,5,6}
        assert!(!ok(TopicKind::Senryu, "からす\nなぜなくのかと\n聞いてみた"));
    }

    #[test]
    fn senryu_tolerates_plus_minus_one_on_each_line() {
        assert!(ok(TopicKind::Senryu, "やせがえる\nまけるないっさ\nこれにあり")); // 5,7,5
        assert!(ok(TopicKind::Senryu, "せがえる\nまけるないっさ\nこれにあり")); // 4,7,5
        assert!(ok(TopicKind::Senryu, "おやせがえる\nまけるないっさ\nこれにあり")); // 6,7,5
    }

    #[test]
    fn senryu_accepts_full_width_space_separators() {
        assert!(ok(TopicKind::Senryu, "やせがえる　まけるないっさ　これにあり"));
    }

    #[test]
    fn senryu_wrong_line_count_always_fails() {
        assert!(!ok(TopicKind::Senryu, "やせがえる\nまけるないっさ"));
        assert!(!ok(
            TopicKind::Senryu,
            "やせがえる\nまけるないっさ\nこれにあり\nおまけ"
        ));
    }

    #[test]
    fn random_limit_minmax_is_inclusive_on_both_bounds() {
        let params = RandomLimitParams {
            mode: LimitMode::MinMax,
            min: Some(20),
            max: Some(100),
        };
        let text = |n: usize| "a".repeat(n);

        let short = validate(TopicKind::RandomLimit, &text(19), None, Some(&params));
        match short {
            Err(PipelineError::Validation(msg)) => {
                assert!(msg.contains("need 1 more"), "unexpected message: {msg}");
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        assert!(validate(TopicKind::RandomLimit, &text(20), None, Some(&params)).is_ok());
        assert!(validate(TopicKind::RandomLimit, &text(100), None, Some(&params)).is_ok());

        let long = validate(TopicKind::RandomLimit, &text(101), None, Some(&params));
        match long {
            Err(PipelineError::Validation(msg)) => {
                assert!(msg.contains("remove 1"), "unexpected message: {msg}");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn random_limit_counts_characters_not_bytes() {
        let params = RandomLimitParams {
            mode: LimitMode::Min,
            min: Some(3),
            max: None,
        };
        // 3 characters, 9 bytes
        assert!(validate(TopicKind::RandomLimit, "あいう", None, Some(&params)).is_ok());
    }

    #[test]
    fn generated_params_stay_inside_their_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let p = generate_limit_params(&mut rng);
            match p.mode {
                LimitMode::Min => {
                    let min = p.min.unwrap();
                    assert!((10..=140).contains(&min));
                    assert!(p.max.is_none());
                }
                LimitMode::Max => {
                    let max = p.max.unwrap();
                    assert!((5..=140).contains(&max));
                    assert!(p.min.is_none());
                }
                LimitMode::MinMax => {
                    let (min, max) = (p.min.unwrap(), p.max.unwrap());
                    assert!(min <= max);
                    assert!((5..=140).contains(&min));
                    assert!((5..=140).contains(&max));
                }
            }
        }
    }

    #[test]
    fn poll_rejects_empty_and_oversize_options() {
        let empty = vec!["".to_string(), "choice".to_string()];
        assert!(validate(TopicKind::Poll, "question", Some(&empty), None).is_err());

        let oversize = vec!["a".repeat(51), "b".to_string()];
        assert!(validate(TopicKind::Poll, "question", Some(&oversize), None).is_err());

        let fine = vec!["tea".to_string(), "coffee".to_string()];
        assert!(validate(TopicKind::Poll, "question", Some(&fine), None).is_ok());
    }

    #[test]
    fn empty_text_is_only_allowed_on_media_topics() {
        assert!(!ok(TopicKind::Normal, ""));
        assert!(ok(TopicKind::ImageOnly, ""));
        assert!(ok(TopicKind::MovaPic, ""));
    }
}
