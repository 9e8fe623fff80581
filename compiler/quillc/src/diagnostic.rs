//! Parse error reports with source snippets.

use std::ops::Range;

use ariadne::{Config, Label, Report, ReportKind, Source};

use quill_syntax::ParseError;

/// Clamp `span` into `source` and widen an empty span to one character
/// so the label has something to point at. At end of input that is the
/// last character.
fn label_range(error: &ParseError, source: &str) -> Range<usize> {
    let len = source.len();
    let start = (error.span.start as usize).min(len);
    let end = (error.span.end as usize).clamp(start, len);
    if start != end {
        return start..end;
    }
    if let Some(c) = source.get(start..).and_then(|rest| rest.chars().next()) {
        start..start + c.len_utf8()
    } else if let Some(c) = source.get(..start).and_then(|head| head.chars().next_back()) {
        start - c.len_utf8()..start
    } else {
        start..end
    }
}

/// Render `error` as a plain-text report against `source`.
pub fn render_parse_error(path: &str, source: &str, error: &ParseError) -> String {
    let range = label_range(error, source);
    let report = Report::build(ReportKind::Error, path, range.start)
        .with_message("could not parse script")
        .with_label(Label::new((path, range)).with_message(&error.message))
        .with_config(Config::default().with_color(false))
        .finish();

    let mut out = Vec::new();
    match report.write((path, Source::from(source)), &mut out) {
        Ok(()) => String::from_utf8_lossy(&out).into_owned(),
        Err(_) => format!("error: {path}: {error}\n"),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use quill_syntax::{parse, Span};

    use super::*;

    #[test]
    fn report_names_file_and_message() {
        let source = "a = (1 + ;";
        let error = parse(source).unwrap_err();
        let report = render_parse_error("demo.q", source, &error);
        assert!(report.contains("could not parse script"), "{report}");
        assert!(report.contains("demo.q"), "{report}");
        assert!(report.contains(&error.message), "{report}");
    }

    #[test]
    fn span_at_end_of_input_is_kept_in_bounds() {
        let source = "f(";
        let error = ParseError::new("unexpected end of input", Span::point(2));
        assert_eq!(label_range(&error, source), 1..2);
        let report = render_parse_error("eof.q", source, &error);
        assert!(report.contains("unexpected end of input"), "{report}");
    }
}
