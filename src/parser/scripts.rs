use scraper::{Html, Selector};

/// Text of every inline `<script>` element, in document order. Elements with
/// no text (e.g. `<script src=...>`) are skipped.
pub fn inline_scripts(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("script") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .map(|el| el.text().collect::<String>())
        .filter(|text| !text.trim().is_empty())
        .collect()
}
