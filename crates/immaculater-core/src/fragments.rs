//! HTML fragments shared by many servlets.
//!
//! Builders splice their arguments in verbatim. Text that may contain markup
//! characters must go through [`crate::escape::escape`] first, and `value`
//! arguments must not contain a double quote.

use tracing::trace;

use crate::view_filter::ViewFilter;

const VIEW_FILTER_TOOLTIP: &str = "<em>All</em> shows all but deleted items. \
<em>Actionable</em> hides completed items and items from inactive contexts and projects. \
<em>Needing review</em> hides reviewed projects.";

/// A one-button form that posts to `servlet`.
///
/// The hidden `uid` field is emitted only when `uid` is given, and the label
/// only when `label_text` is given.
#[tracing::instrument(level = "trace", skip(csrf_token, hidden_values))]
pub fn button_form(
    servlet: &str,
    csrf_token: &str,
    uid: Option<&str>,
    hidden_values: &str,
    button_text: &str,
    label_text: Option<&str>,
) -> String {
    let mut html = format!(r#"<form class="form-inline i-pjax-form" action="{servlet}" method="post">"#);
    html.push_str(csrf_token);
    push_uid_field(&mut html, uid);
    html.push_str(hidden_values);
    html.push_str(r#"<div class="form-group">"#);
    if let Some(label) = label_text {
        html.push_str(&format!(r#"<label for="x123">{label}</label>"#));
    }
    html.push_str(&format!(
        r#"<input id="x123" type="submit" value="{button_text}" class="btn btn-primary form-control"></div></form>"#
    ));
    html
}

/// One `<option>`, selected iff `currently_selected` is exactly `value`.
pub fn option(value: &str, text: &str, currently_selected: Option<&str>) -> String {
    let selected = if currently_selected == Some(value) {
        r#" selected="selected""#
    } else {
        ""
    };
    format!(r#"<option value="{value}"{selected}>{text}</option>"#)
}

/// The form that switches the active view filter.
///
/// `currently_selected` matching none of the filters leaves every option
/// unselected.
#[tracing::instrument(level = "trace", skip(csrf_token))]
pub fn view_filter_form(
    servlet: &str,
    csrf_token: &str,
    uid: Option<&str>,
    currently_selected: Option<&str>,
) -> String {
    let mut html = format!(
        r#"<form role="form" class="i-pjax-form form-inline" action="{servlet}" method="post">"#
    );
    html.push_str(csrf_token);
    push_uid_field(&mut html, uid);
    html.push_str(r#"<input type="hidden" name="cmd" value="view">"#);
    html.push_str(&format!(
        r#"<div data-toggle="tooltip" data-placement="top" data-html="true" title="{VIEW_FILTER_TOOLTIP}" class="form-group">"#
    ));
    html.push_str(r#"<select name="view_filter" class="form-control i-submits-when-changed">"#);
    for filter in ViewFilter::ORDERED {
        html.push_str(&option(filter.ui_name(), filter.label(), currently_selected));
    }
    // No closing </select>; the parser closes it at the submit input.
    html.push_str(r#"<input type="submit" value="Set View Filter" class="btn btn-primary">"#);
    html.push_str("</div></form>");
    trace!(len = html.len(), "built view filter form");
    html
}

/// [`view_filter_form`] with `current` preselected.
pub fn view_filter_form_for(
    servlet: &str,
    csrf_token: &str,
    uid: Option<&str>,
    current: ViewFilter,
) -> String {
    view_filter_form(servlet, csrf_token, uid, Some(current.ui_name()))
}

fn push_uid_field(html: &mut String, uid: Option<&str>) {
    if let Some(uid) = uid {
        html.push_str(&format!(r#"<input type="hidden" name="uid" value="{uid}">"#));
    }
}

#[cfg(test)]
mod fragments_tests {
    use super::*;

    const CSRF: &str = r#"<input type="hidden" name="csrfmiddlewaretoken" value="tok">"#;

    fn option_values(html: &str) -> Vec<&str> {
        html.split(r#"<option value=""#)
            .skip(1)
            .filter_map(|rest| rest.split('"').next())
            .collect()
    }

    #[test]
    fn button_form_with_everything() {
        let html = button_form(
            "/todo/action",
            CSRF,
            Some("42"),
            r#"<input type="hidden" name="cmd" value="complete">"#,
            "Complete",
            Some("Done?"),
        );
        assert_eq!(
            html,
            concat!(
                r#"<form class="form-inline i-pjax-form" action="/todo/action" method="post">"#,
                r#"<input type="hidden" name="csrfmiddlewaretoken" value="tok">"#,
                r#"<input type="hidden" name="uid" value="42">"#,
                r#"<input type="hidden" name="cmd" value="complete">"#,
                r#"<div class="form-group">"#,
                r#"<label for="x123">Done?</label>"#,
                r#"<input id="x123" type="submit" value="Complete" class="btn btn-primary form-control">"#,
                "</div></form>"
            )
        );
    }

    #[test]
    fn button_form_omits_absent_uid_and_label() {
        let html = button_form("/todo/action", CSRF, None, "", "Go", None);
        assert!(!html.contains(r#"name="uid""#));
        assert!(!html.contains("<label"));
        assert!(html.contains(r#"<input id="x123" type="submit" value="Go""#));
    }

    #[test]
    fn empty_uid_and_label_are_still_rendered() {
        let html = button_form("/s", CSRF, Some(""), "", "Go", Some(""));
        assert!(html.contains(r#"<input type="hidden" name="uid" value="">"#));
        assert!(html.contains(r#"<label for="x123"></label>"#));
    }

    #[test]
    fn button_text_is_not_escaped() {
        let html = button_form("/s", CSRF, None, "", "<b>", None);
        assert!(html.contains(r#"value="<b>""#));
        let escaped = button_form("/s", CSRF, None, "", &crate::escape::escape("<b>"), None);
        assert!(escaped.contains(r#"value="&lt;b&gt;""#));
    }

    #[test]
    fn option_selected_only_on_exact_match() {
        assert_eq!(
            option("all", "All", Some("all")),
            r#"<option value="all" selected="selected">All</option>"#
        );
        assert_eq!(option("all", "All", Some("actionable")), r#"<option value="all">All</option>"#);
        assert_eq!(option("all", "All", Some("ALL")), r#"<option value="all">All</option>"#);
        assert_eq!(option("all", "All", Some("all ")), r#"<option value="all">All</option>"#);
        assert_eq!(option("all", "All", None), r#"<option value="all">All</option>"#);
        assert!(option("", "Blank", Some("")).contains(r#"selected="selected""#));
    }

    #[test]
    fn option_value_is_inserted_raw() {
        let html = option(r#"a"b"#, "x", None);
        assert_eq!(html, r#"<option value="a"b">x</option>"#);
    }

    #[test]
    fn view_filter_form_lists_six_options_in_order() {
        for selected in [None, Some("all"), Some("needing_review"), Some("nonsense")] {
            let html = view_filter_form("/todo/home", CSRF, Some("7"), selected);
            assert_eq!(html.matches("<option ").count(), 6);
            assert_eq!(
                option_values(&html),
                vec![
                    "all",
                    "actionable",
                    "needing_review",
                    "incomplete",
                    "inactive_and_incomplete",
                    "all_even_deleted"
                ]
            );
        }
    }

    #[test]
    fn view_filter_form_marks_the_current_filter() {
        let html = view_filter_form("/todo/home", CSRF, None, Some("incomplete"));
        assert_eq!(html.matches(r#"selected="selected""#).count(), 1);
        assert!(html.contains(
            r#"<option value="incomplete" selected="selected">Incomplete, even if inactive</option>"#
        ));

        let none = view_filter_form("/todo/home", CSRF, None, Some("everything"));
        assert_eq!(none.matches(r#"selected="selected""#).count(), 0);
    }

    #[test]
    fn view_filter_form_fixed_parts() {
        let html = view_filter_form("/todo/home", CSRF, None, None);
        assert!(html.starts_with(
            r#"<form role="form" class="i-pjax-form form-inline" action="/todo/home" method="post"><input type="hidden" name="csrfmiddlewaretoken""#
        ));
        assert!(!html.contains(r#"name="uid""#));
        assert!(html.contains(r#"<input type="hidden" name="cmd" value="view">"#));
        assert!(html.contains(
            r#"<div data-toggle="tooltip" data-placement="top" data-html="true" title="<em>All</em> shows all but deleted items. <em>Actionable</em> hides completed items and items from inactive contexts and projects. <em>Needing review</em> hides reviewed projects." class="form-group">"#
        ));
        assert!(html.contains(
            r#"<select name="view_filter" class="form-control i-submits-when-changed">"#
        ));
        assert!(html.ends_with(
            r#"<input type="submit" value="Set View Filter" class="btn btn-primary"></div></form>"#
        ));
        assert!(!html.contains("</select>"));
    }

    #[test]
    fn typed_view_filter_form_matches_string_form() {
        assert_eq!(
            view_filter_form_for("/s", CSRF, Some("1"), ViewFilter::AllEvenDeleted),
            view_filter_form("/s", CSRF, Some("1"), Some("all_even_deleted"))
        );
    }

    #[test]
    fn builders_are_deterministic() {
        let a = view_filter_form("/s", CSRF, Some("1"), Some("all"));
        let b = view_filter_form("/s", CSRF, Some("1"), Some("all"));
        assert_eq!(a, b);
    }
}
