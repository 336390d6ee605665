use crate::types::Site;

const ELLIPSIS: &str = "...";

/// Names longer than `budget` characters are cut and get `...`. The result is
/// escaped after cutting, so the budget counts raw characters.
pub fn tooltip(name: &str, budget: usize) -> String {
    match name.char_indices().nth(budget) {
        Some((cut, _)) => format!("{}{}", escape(&name[..cut]), ELLIPSIS),
        None => escape(name),
    }
}

pub fn popup_html(site: &Site) -> String {
    format!(
        r#"<div style="font-family: Arial; width: 250px;">
<h4 style="color: #2E4057; margin-bottom: 10px;">🏘️ {name}</h4>
<hr style="margin: 5px 0;">
<p><strong>🌿 Bioma:</strong> {category}</p>
<p><strong>⚠️ Intempérie:</strong> {weather}</p>
<p><strong>👥 População Quilombola:</strong> {population}</p>
<p><strong>📍 Macrorregião:</strong> {region}</p>
</div>"#,
        name = escape(&site.name),
        category = escape(&site.category),
        weather = escape(&site.weather),
        population = escape(&site.population),
        region = escape(&site.region),
    )
}

pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::site;

    #[test]
    fn short_names_are_untouched() {
        assert_eq!(tooltip("Quilombo do Rosa", 40), "Quilombo do Rosa");
    }

    #[test]
    fn truncates_only_past_the_budget() {
        let exact = "a".repeat(40);
        assert_eq!(tooltip(&exact, 40), exact);

        let over = "b".repeat(41);
        assert_eq!(tooltip(&over, 40), format!("{}...", "b".repeat(40)));
    }

    #[test]
    fn counts_characters_not_bytes() {
        let name = "Comunidade Remanescente de Quilombo São João";
        assert_eq!(name.chars().count(), 44);
        assert_eq!(tooltip(name, 40), "Comunidade Remanescente de Quilombo São ...");

        let accented = "ã".repeat(40);
        assert_eq!(tooltip(&accented, 40), accented);
    }

    #[test]
    fn tooltip_escapes_markup() {
        assert_eq!(
            tooltip("<img src=x onerror=alert(1)> & Co", 40),
            "&lt;img src=x onerror=alert(1)&gt; &amp; Co"
        );
    }

    #[test]
    fn tooltip_budget_counts_unescaped_characters() {
        let exact = format!("{}&<", "a".repeat(38));
        assert_eq!(tooltip(&exact, 40), format!("{}&amp;&lt;", "a".repeat(38)));

        let over = format!("{}&<b", "a".repeat(38));
        assert_eq!(tooltip(&over, 40), format!("{}&amp;&lt;...", "a".repeat(38)));

        let cut_before_entity = format!("{}&", "a".repeat(40));
        assert_eq!(tooltip(&cut_before_entity, 40), format!("{}...", "a".repeat(40)));
    }

    #[test]
    fn popup_lists_every_attribute() {
        let mut s = site("Kalunga", "Cerrado", -13.0, -47.0);
        s.weather = "Seca".to_string();
        s.population = "8000".to_string();
        s.region = "Centro-Oeste".to_string();

        let html = popup_html(&s);
        for text in ["Kalunga", "Cerrado", "Seca", "8000", "Centro-Oeste"] {
            assert!(html.contains(text), "missing {text}");
        }
    }

    #[test]
    fn popup_escapes_markup() {
        let s = site("<b>Rio & Mar</b>", "Amazônia", -3.0, -60.0);
        let html = popup_html(&s);
        assert!(html.contains("&lt;b&gt;Rio &amp; Mar&lt;/b&gt;"));
        assert!(!html.contains("<b>Rio"));
    }
}
