/// Escapes `text` so it renders verbatim when inserted as markup.
///
/// Covers `&`, `<`, `>` and `"`, which keeps the result safe both as text
/// content and inside a double-quoted attribute.
pub fn escape(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).into_owned()
}
