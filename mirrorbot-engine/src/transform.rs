//! Content transforms — provenance marker strip/insert, page
//! classification, and the normalized-equality check that gates writes.
//!
//! Markup here is position-sensitive: a redirect directive must stay on the
//! first line, and markers on transcludable templates must stay inside a
//! `<noinclude>` guard so they never leak into transcluding pages. Every
//! transform re-derives the page class from title + content; nothing is
//! cached between rounds.

use chrono::{DateTime, Duration, Utc};

/// Mirror marker template, matched case-insensitively as a whole line.
pub const MIRROR_MARKER: &str = "{{mirrorpage}}";

/// Provenance marker template prefix; full form is
/// `{{synchro|<display name>|<formatted timestamp>}}`.
const SYNCHRO_PREFIX: &str = "{{synchro|";

/// Page-header template token. The provenance marker is inserted directly
/// after the first line containing it.
const HEADER_TOKEN: &str = "{{h0";

/// Recognized redirect directives (canonical and localized), matched
/// case-insensitively at the very start of the content.
const REDIRECT_TOKENS: &[&str] = &["#redirect", "#重新導向", "#重定向"];

/// Title prefixes that put a page in the template namespace.
const TEMPLATE_PREFIXES: &[&str] = &["模板:", "template:"];

/// Offset applied when rendering marker timestamps for human readers.
/// The participating wikis share one community timezone (UTC+8).
const DISPLAY_UTC_OFFSET_HOURS: i64 = 8;

/// Page class at sync time. Exactly one per title per round; determines
/// marker placement and guarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageClass {
    Ordinary,
    /// Title lives in the template namespace; markers must be guarded.
    Template,
    /// Content begins with a redirect directive; markers must go last.
    Redirect,
}

/// Derive the page class from title and content.
///
/// Redirect wins over template: placement safety for the directive matters
/// more than guarding on a page nothing should be transcluding anyway.
pub fn classify(title: &str, content: &str) -> PageClass {
    if is_redirect(content) {
        return PageClass::Redirect;
    }
    let lower_title = title.to_lowercase();
    if TEMPLATE_PREFIXES.iter().any(|p| lower_title.starts_with(p)) {
        return PageClass::Template;
    }
    PageClass::Ordinary
}

fn is_redirect(content: &str) -> bool {
    let head = content.trim_start().to_lowercase();
    REDIRECT_TOKENS.iter().any(|t| head.starts_with(t))
}

// ---------------------------------------------------------------------------
// Marker strip
// ---------------------------------------------------------------------------

/// Remove provenance and mirror marker lines.
///
/// Template pages only shed the `<noinclude>`-guarded form; an unguarded
/// marker on a template page is someone's hand edit and is left alone.
/// Ordinary and redirect pages only shed the unguarded form. A trailing
/// newline on the input survives, so stripping an inserted marker restores
/// the content byte-for-byte.
pub fn strip_markers(content: &str, class: PageClass) -> String {
    let guarded = matches!(class, PageClass::Template);
    let stripped = content
        .lines()
        .filter(|line| !is_marker_line(line, guarded))
        .collect::<Vec<_>>()
        .join("\n");
    restore_trailing_newline(stripped, content)
}

/// `lines()` swallows a final newline; put it back when the original had
/// one.
fn restore_trailing_newline(mut rebuilt: String, original: &str) -> String {
    if original.ends_with('\n') && !rebuilt.ends_with('\n') {
        rebuilt.push('\n');
    }
    rebuilt
}

fn is_marker_line(line: &str, guarded: bool) -> bool {
    let lower = line.trim().to_lowercase();
    if guarded {
        lower == "<noinclude>{{mirrorpage}}</noinclude>"
            || (lower.starts_with("<noinclude>{{synchro|") && lower.ends_with("}}</noinclude>"))
    } else {
        lower == MIRROR_MARKER
            || (lower.starts_with(SYNCHRO_PREFIX) && lower.ends_with("}}"))
    }
}

// ---------------------------------------------------------------------------
// Marker insert
// ---------------------------------------------------------------------------

/// Render the provenance marker line for a propagation from `source_name`
/// at `timestamp`.
pub fn render_marker(source_name: &str, timestamp: DateTime<Utc>) -> String {
    let local = timestamp + Duration::hours(DISPLAY_UTC_OFFSET_HOURS);
    format!(
        "{{{{synchro|{}|{}}}}}",
        source_name,
        local.format("%Y年%m月%d日 %H:%M")
    )
}

/// Insert a fresh provenance marker into `content`.
///
/// Placement: redirects get it appended as the final line (anything earlier
/// would demote the directive to plain text); otherwise it goes right after
/// the first header-token line, or at the very top when there is none.
/// Template pages get the guarded form. Afterwards, runs of three or more
/// blank lines collapse to a single blank line — repeated marker churn
/// otherwise accretes whitespace.
pub fn insert_marker(
    content: &str,
    class: PageClass,
    source_name: &str,
    timestamp: DateTime<Utc>,
) -> String {
    let marker = match class {
        PageClass::Template => format!(
            "<noinclude>{}</noinclude>",
            render_marker(source_name, timestamp)
        ),
        _ => render_marker(source_name, timestamp),
    };

    let mut lines: Vec<String> = content.lines().map(str::to_owned).collect();
    match class {
        PageClass::Redirect => lines.push(marker),
        _ => {
            let header = lines
                .iter()
                .position(|l| l.to_lowercase().contains(HEADER_TOKEN));
            match header {
                Some(i) => lines.insert(i + 1, marker),
                None => lines.insert(0, marker),
            }
        }
    }

    restore_trailing_newline(collapse_blank_runs(&lines).join("\n"), content)
}

/// Collapse every run of three or more blank lines to exactly one blank
/// line. Shorter runs are kept byte-for-byte.
fn collapse_blank_runs(lines: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(lines.len());
    let mut i = 0;
    while i < lines.len() {
        if lines[i].trim().is_empty() {
            let start = i;
            while i < lines.len() && lines[i].trim().is_empty() {
                i += 1;
            }
            if i - start >= 3 {
                out.push(String::new());
            } else {
                out.extend(lines[start..i].iter().cloned());
            }
        } else {
            out.push(lines[i].clone());
            i += 1;
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Normalized equality
// ---------------------------------------------------------------------------

/// Strip markers, drop all whitespace, case-fold.
pub fn normalize_for_compare(content: &str, class: PageClass) -> String {
    strip_markers(content, class)
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Whether two contents are equal once markers and whitespace churn are
/// disregarded. Equal means a write would produce a no-op revision and must
/// be skipped.
pub fn normalized_equal(a: &str, b: &str, class: PageClass) -> bool {
    normalize_for_compare(a, class) == normalize_for_compare(b, class)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rstest::rstest;

    use super::*;

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        // 2023-05-01 hh:mm UTC → displays as hh+8:mm on 五月1日.
        Utc.with_ymd_and_hms(2023, 5, 1, h, m, 0).unwrap()
    }

    #[rstest]
    #[case("#REDIRECT [[Foo]]")]
    #[case("#redirect [[Foo]]")]
    #[case("#重新導向 [[Foo]]")]
    #[case("#重定向 [[Foo]]")]
    #[case("  #REDIRECT [[Foo]]")]
    fn redirect_content_classifies_as_redirect(#[case] content: &str) {
        assert_eq!(classify("Foo", content), PageClass::Redirect);
    }

    #[rstest]
    #[case("模板:Infobox")]
    #[case("Template:Infobox")]
    #[case("template:infobox")]
    fn template_titles_classify_as_template(#[case] title: &str) {
        assert_eq!(classify(title, "{{#if:x|y}}"), PageClass::Template);
    }

    #[test]
    fn redirect_wins_over_template_namespace() {
        assert_eq!(
            classify("模板:Old", "#REDIRECT [[模板:New]]"),
            PageClass::Redirect
        );
    }

    #[test]
    fn ordinary_title_and_content() {
        assert_eq!(classify("Foo", "{{H0}}\nHello"), PageClass::Ordinary);
    }

    #[test]
    fn marker_renders_in_display_timezone() {
        // 04:30 UTC → 12:30 UTC+8.
        assert_eq!(
            render_marker("Reko Wiki", ts(4, 30)),
            "{{synchro|Reko Wiki|2023年05月01日 12:30}}"
        );
    }

    #[test]
    fn insert_after_header_line() {
        let out = insert_marker("{{H0}}\nHello", PageClass::Ordinary, "A", ts(4, 30));
        assert_eq!(out, "{{H0}}\n{{synchro|A|2023年05月01日 12:30}}\nHello");
    }

    #[test]
    fn insert_at_top_without_header() {
        let out = insert_marker("Hello\nWorld", PageClass::Ordinary, "A", ts(4, 30));
        assert!(out.starts_with("{{synchro|A|"));
        assert!(out.ends_with("\nHello\nWorld"));
    }

    #[test]
    fn header_token_match_is_case_insensitive() {
        let out = insert_marker("{{h0|x}}\nBody", PageClass::Ordinary, "A", ts(0, 0));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "{{h0|x}}");
        assert!(lines[1].starts_with("{{synchro|"));
    }

    #[test]
    fn redirect_marker_is_appended_last() {
        let out = insert_marker("#REDIRECT [[Foo]]", PageClass::Redirect, "A", ts(4, 30));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "#REDIRECT [[Foo]]");
        assert!(lines.last().unwrap().starts_with("{{synchro|"));
        assert!(out.starts_with("#REDIRECT"));
    }

    #[test]
    fn template_marker_is_guarded() {
        let out = insert_marker("{{H0}}\n{{#if:x|y}}", PageClass::Template, "A", ts(4, 30));
        assert!(out.contains("<noinclude>{{synchro|A|2023年05月01日 12:30}}</noinclude>"));
    }

    #[test]
    fn strip_roundtrips_insert_on_ordinary_page() {
        let content = "{{H0}}\nHello\n\nWorld";
        let inserted = insert_marker(content, PageClass::Ordinary, "A", ts(4, 30));
        assert_ne!(inserted, content);
        assert_eq!(strip_markers(&inserted, PageClass::Ordinary), content);
    }

    #[test]
    fn strip_roundtrips_insert_on_template_page() {
        let content = "{{H0}}\n{{#if:a|b}}";
        let inserted = insert_marker(content, PageClass::Template, "A", ts(4, 30));
        assert_eq!(strip_markers(&inserted, PageClass::Template), content);
    }

    #[test]
    fn strip_roundtrips_insert_with_trailing_newline() {
        let content = "{{H0}}\nHello\n";
        let inserted = insert_marker(content, PageClass::Ordinary, "A", ts(4, 30));
        assert!(inserted.ends_with("Hello\n"));
        assert_eq!(strip_markers(&inserted, PageClass::Ordinary), content);
    }

    #[test]
    fn strip_removes_mirror_marker_case_insensitively() {
        let content = "{{H0}}\n{{Mirrorpage}}\nBody";
        assert_eq!(
            strip_markers(content, PageClass::Ordinary),
            "{{H0}}\nBody"
        );
    }

    #[test]
    fn strip_on_template_leaves_unguarded_marker_untouched() {
        let content = "{{H0}}\n{{synchro|A|2023年05月01日 12:30}}\nBody";
        assert_eq!(strip_markers(content, PageClass::Template), content);
    }

    #[test]
    fn strip_on_ordinary_leaves_guarded_marker_untouched() {
        let content = "<noinclude>{{synchro|A|2023年05月01日 12:30}}</noinclude>\nBody";
        assert_eq!(strip_markers(content, PageClass::Ordinary), content);
    }

    #[test]
    fn insert_collapses_long_blank_runs() {
        let content = "{{H0}}\nA\n\n\n\nB";
        let out = insert_marker(content, PageClass::Ordinary, "A", ts(0, 0));
        assert!(out.contains("A\n\nB"), "run of 4 blanks should become 1: {out:?}");
    }

    #[test]
    fn short_blank_runs_survive_insert() {
        let content = "{{H0}}\nA\n\nB";
        let out = insert_marker(content, PageClass::Ordinary, "A", ts(0, 0));
        assert!(out.ends_with("A\n\nB"));
    }

    #[test]
    fn normalized_equality_ignores_markers_whitespace_and_case() {
        let a = "{{H0}}\n{{synchro|A|2023年05月01日 12:30}}\nHello World";
        let b = "{{H0}}\nhello   world";
        assert!(normalized_equal(a, b, PageClass::Ordinary));
    }

    #[test]
    fn normalized_equality_detects_real_difference() {
        assert!(!normalized_equal(
            "{{H0}}\nHello",
            "{{H0}}\nHi",
            PageClass::Ordinary
        ));
    }
}
