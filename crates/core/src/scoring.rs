//! Candidate scoring for body extraction.
//!
//! Each candidate element gets a score built from four signals: what tag it
//! is, whether its class/id names look like prose or chrome, how much text it
//! holds, and how much of that text sits inside links. The weights follow the
//! classic readability heuristics, tuned for the class-mangled markup that
//! rendered Article pages produce.

use crate::parse::Element;
use regex::Regex;

/// Tunable weights for the scoring signals.
#[derive(Debug, Clone)]
pub struct ScoreConfig {
    /// Bonus when a class or id matches a prose-like pattern
    pub positive_weight: f64,
    /// Penalty when a class or id matches a chrome-like pattern
    pub negative_weight: f64,
    /// Cap on the text-length contribution
    pub max_char_density_score: f64,
    /// Cap on the comma-count contribution
    pub max_comma_density_score: f64,
    /// Characters of text per density point
    pub chars_per_point: usize,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            positive_weight: 25.0,
            negative_weight: -25.0,
            max_char_density_score: 3.0,
            max_comma_density_score: 3.0,
            chars_per_point: 100,
        }
    }
}

/// Score breakdown for one candidate.
///
/// `final_score` is what extraction ranks on; the other fields keep the
/// individual signals visible so callers can boost or inspect them.
#[derive(Debug, Clone)]
pub struct ScoreResult {
    /// Contribution from the tag name alone
    pub tag_score: f64,
    /// Contribution from class/id pattern matches
    pub pattern_weight: f64,
    /// Contribution from text length and comma count
    pub density: f64,
    /// Fraction of text characters that sit inside `<a>` elements
    pub link_density: f64,
    /// Combined score after the link and code penalties
    pub final_score: f64,
}

/// Class/id substrings that mark an element as likely prose. `draft` and
/// `richtext` cover the Draft.js wrappers Article bodies render into.
const PROSE_PATTERNS: &str =
    r"(?i)(article|body|content|draft|entry|hentry|h-entry|main|page|post|richtext|text|blog|story|tweet)";

/// Class/id substrings that mark an element as page chrome rather than prose.
const CHROME_PATTERNS: &str = r"(?i)(banner|breadcrumbs?|combx|comment|community|disqus|extra|foot|header|menu|modal|related|remark|rss|shoutbox|sidebar|sponsor|ad-break|agegate|pagination|pager|popup|toolbar|highlight|code|example)";

/// How strongly a tag suggests article prose. Containers score positive,
/// list/metadata tags slightly negative, headers and navigation strongly
/// negative. `pre` stays neutral: code blocks appear inside articles but are
/// rarely the body itself.
fn tag_score(tag: &str) -> f64 {
    match tag {
        "article" => 10.0,
        "section" => 8.0,
        "div" => 5.0,
        "td" | "blockquote" => 3.0,
        "form" | "address" | "ol" | "ul" | "dl" | "dd" | "dt" | "li" => -3.0,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" | "header" | "footer" | "nav" => -5.0,
        _ => 0.0,
    }
}

/// Weight from class/id pattern matches.
///
/// The id is checked as a whole; class names are checked token by token so a
/// single prose-like class wins even among utility classes. A prose match
/// always takes precedence over a chrome match on the same attribute.
fn pattern_weight(element: &Element<'_>, config: &ScoreConfig) -> f64 {
    let prose = Regex::new(PROSE_PATTERNS).unwrap();
    let chrome = Regex::new(CHROME_PATTERNS).unwrap();

    if let Some(id) = element.attr("id") {
        if prose.is_match(id) {
            return config.positive_weight;
        }
        if chrome.is_match(id) {
            return config.negative_weight;
        }
    }

    if let Some(class) = element.attr("class") {
        for token in class.split_whitespace() {
            if prose.is_match(token) {
                return config.positive_weight;
            }
            if chrome.is_match(token) {
                return config.negative_weight;
            }
        }
    }

    0.0
}

/// Density signal: one point per `chars_per_point` characters plus one per
/// comma, each capped. Commas are a cheap prose-vs-navigation tell.
fn density_score(text: &str, config: &ScoreConfig) -> f64 {
    let char_points =
        ((text.chars().count() / config.chars_per_point) as f64).min(config.max_char_density_score);
    let comma_points = (text.matches(',').count() as f64).min(config.max_comma_density_score);
    char_points + comma_points
}

/// Fraction of an element's text that lives inside links, from 0.0 to 1.0.
/// Both counts ignore whitespace so markup indentation between elements
/// cannot dilute the signal. Empty elements count as 0.0.
pub fn link_density(element: &Element<'_>) -> f64 {
    let total = prose_len(&element.text());
    if total == 0 {
        return 0.0;
    }

    let linked: usize = element
        .select("a")
        .unwrap_or_default()
        .iter()
        .map(|anchor| prose_len(&anchor.text()))
        .sum();

    linked as f64 / total as f64
}

/// Character count with all whitespace excluded.
fn prose_len(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// Heuristic for `<pre>` blocks whose text is source code rather than prose:
/// heavy on symbols, light on commas and spaces.
fn looks_like_code(text: &str) -> bool {
    if text.len() <= 50 {
        return false;
    }
    let len = text.len() as f64;
    let commas = text.matches(',').count() as f64 / len;
    let spaces = text.matches(' ').count() as f64 / len;
    let symbols =
        text.chars().filter(|c| !c.is_alphanumeric() && !c.is_whitespace()).count() as f64 / len;

    symbols > 0.15 && commas < 0.01 && spaces < 0.15
}

/// Score one candidate element.
///
/// The raw score is `tag + pattern weight + density`, with a flat -10 for
/// `<pre>` blocks that look like code. A positive raw score is then scaled
/// down by link density, at half strength when the element either matched a
/// prose pattern or carries more than 500 characters of text, since long
/// prose legitimately contains links. Negative raw scores pass through
/// unscaled.
pub fn calculate_score(element: &Element<'_>, config: &ScoreConfig) -> ScoreResult {
    let text = element.text();

    let tag = tag_score(element.tag_name().as_str());
    let weight = pattern_weight(element, config);
    let density = density_score(&text, config);
    let links = link_density(element);

    let code_penalty =
        if element.tag_name() == "pre" && looks_like_code(&text) { -10.0 } else { 0.0 };

    let prose_like = weight > 0.0 || text.chars().count() > 500;
    let link_penalty = if prose_like { 1.0 - links * 0.5 } else { 1.0 - links };

    // Scaling a negative score toward zero would erase the chrome penalty
    // for link-heavy elements, so link density only discounts positive raw
    // scores.
    let raw = tag + weight + density + code_penalty;
    let final_score = if raw > 0.0 { raw * link_penalty } else { raw };

    ScoreResult { tag_score: tag, pattern_weight: weight, density, link_density: links, final_score }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::Document;

    fn first<'a>(doc: &'a Document, selector: &str) -> Element<'a> {
        doc.select(selector).unwrap().into_iter().next().unwrap()
    }

    #[rstest::rstest]
    #[case("article", 10.0)]
    #[case("section", 8.0)]
    #[case("div", 5.0)]
    #[case("blockquote", 3.0)]
    #[case("pre", 0.0)]
    #[case("ul", -3.0)]
    #[case("nav", -5.0)]
    #[case("span", 0.0)]
    fn test_tag_score(#[case] tag: &str, #[case] expected: f64) {
        assert_eq!(tag_score(tag), expected);
    }

    #[test]
    fn test_pattern_weight_prose_class() {
        let doc = Document::parse(r#"<div class="article-body">x</div>"#).unwrap();
        let config = ScoreConfig::default();
        assert_eq!(pattern_weight(&first(&doc, "div"), &config), 25.0);
    }

    #[test]
    fn test_pattern_weight_draftjs_class() {
        let doc = Document::parse(r#"<div class="DraftEditor-root">x</div>"#).unwrap();
        let config = ScoreConfig::default();
        assert_eq!(pattern_weight(&first(&doc, "div"), &config), 25.0);
    }

    #[test]
    fn test_pattern_weight_chrome_class() {
        let doc = Document::parse(r#"<div class="sidebar">x</div>"#).unwrap();
        let config = ScoreConfig::default();
        assert_eq!(pattern_weight(&first(&doc, "div"), &config), -25.0);
    }

    #[test]
    fn test_pattern_weight_mangled_classes_neutral() {
        // Rendered pages emit hashed utility classes that match nothing.
        let doc = Document::parse(r#"<div class="css-175oi2r r-1igl3o0" id="w">x</div>"#).unwrap();
        let config = ScoreConfig::default();
        assert_eq!(pattern_weight(&first(&doc, "div"), &config), 0.0);
    }

    #[test]
    fn test_pattern_weight_prose_beats_chrome_in_id() {
        let doc = Document::parse(r#"<div id="main-article">x</div>"#).unwrap();
        let config = ScoreConfig::default();
        assert_eq!(pattern_weight(&first(&doc, "div"), &config), 25.0);
    }

    #[test]
    fn test_density_score_caps() {
        let config = ScoreConfig::default();
        assert_eq!(density_score("short", &config), 0.0);
        assert_eq!(density_score(&"a".repeat(150), &config), 1.0);
        // Char points cap at 3 no matter how long the text gets.
        assert_eq!(density_score(&"a".repeat(5000), &config), 3.0);
        assert_eq!(density_score("a, b, c, d, e, f", &config), 3.0);
    }

    #[test]
    fn test_link_density_bounds() {
        let doc = Document::parse(
            r##"<div id="none">plain text</div>
                <div id="all"><a href="#">only a link</a></div>
                <div id="indented">
                    <a href="#">still only a link</a>
                </div>
                <div id="empty"></div>"##,
        )
        .unwrap();

        assert_eq!(link_density(&first(&doc, "#none")), 0.0);
        assert_eq!(link_density(&first(&doc, "#all")), 1.0);
        assert_eq!(link_density(&first(&doc, "#indented")), 1.0);
        assert_eq!(link_density(&first(&doc, "#empty")), 0.0);
    }

    #[test]
    fn test_link_density_partial() {
        let doc =
            Document::parse(r##"<div>before <a href="#">link</a> after</div>"##).unwrap();
        let density = link_density(&first(&doc, "div"));
        assert!(density > 0.0 && density < 1.0);
    }

    #[test]
    fn test_looks_like_code() {
        let code = "fn main(){let x=vec![1;8];for i in x.iter(){println!(\"{i}\");}}@#$%^&*()_+";
        assert!(looks_like_code(code));

        let prose = "This sentence reads like ordinary prose, with commas, spaces, and words \
                     that go on long enough to clear the length gate.";
        assert!(!looks_like_code(prose));

        assert!(!looks_like_code("short(){}"));
    }

    #[test]
    fn test_calculate_score_prose_article() {
        let doc = Document::parse(
            r##"<article class="main-content">
                This is a long run of prose, with several commas, enough characters
                to earn density points, and a single small link.
                <a href="#">ref</a>
                More sentences follow, with more commas, keeping the body firmly
                in prose territory for the scorer.
            </article>"##,
        )
        .unwrap();

        let result = calculate_score(&first(&doc, "article"), &ScoreConfig::default());
        assert_eq!(result.tag_score, 10.0);
        assert_eq!(result.pattern_weight, 25.0);
        assert!(result.density > 0.0);
        assert!(result.link_density > 0.0 && result.link_density < 0.2);
        assert!(result.final_score > 25.0);
    }

    #[test]
    fn test_calculate_score_nav_goes_negative() {
        let doc = Document::parse(
            r##"<nav class="menu"><a href="#">Home</a><a href="#">About</a><a href="#">More</a></nav>"##,
        )
        .unwrap();

        let result = calculate_score(&first(&doc, "nav"), &ScoreConfig::default());
        assert_eq!(result.tag_score, -5.0);
        assert_eq!(result.pattern_weight, -25.0);
        // Fully linked, yet the chrome penalty survives untouched: a
        // link-heavy nav must not float back up toward zero.
        assert_eq!(result.link_density, 1.0);
        assert_eq!(result.final_score, -30.0);
    }

    #[test]
    fn test_calculate_score_empty_chrome_div() {
        let doc = Document::parse(r#"<div class="sidebar"></div>"#).unwrap();
        let result = calculate_score(&first(&doc, "div"), &ScoreConfig::default());
        assert_eq!(result.final_score, -20.0);
    }

    #[test]
    fn test_calculate_score_link_farm_penalized() {
        let doc = Document::parse(
            r##"<div><a href="#">one</a> <a href="#">two</a> <a href="#">three</a>
                <a href="#">four</a> <a href="#">five</a></div>"##,
        )
        .unwrap();

        let result = calculate_score(&first(&doc, "div"), &ScoreConfig::default());
        let raw = result.tag_score + result.pattern_weight + result.density;
        // Indentation between the anchors must not dilute the ratio.
        assert_eq!(result.link_density, 1.0);
        assert!(result.final_score < raw);
    }

    #[test]
    fn test_calculate_score_code_pre_penalized() {
        let code = "fn main(){let x=vec![1;8];for i in x.iter(){println!(\"{i}\");}}@#$%";
        let html = format!("<pre>{}</pre>", code.replace('<', "&lt;"));
        let doc = Document::parse(&html).unwrap();

        let result = calculate_score(&first(&doc, "pre"), &ScoreConfig::default());
        assert!(result.final_score < 0.0);
    }

    #[test]
    fn test_long_prose_halves_link_penalty() {
        let body = "Plain prose sentence that repeats to pass five hundred characters. ".repeat(10);
        let html = format!(r##"<p>{}<a href="#">a fairly long link label right here</a></p>"##, body);

        let doc = Document::parse(&html).unwrap();
        let rich = calculate_score(&first(&doc, "p"), &ScoreConfig::default());

        // Over 500 chars of text, so the link penalty applies at half strength.
        let raw = rich.tag_score + rich.pattern_weight + rich.density;
        assert!(rich.final_score > raw * (1.0 - rich.link_density));
    }
}
