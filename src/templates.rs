//! Per-content-type public templates. Every interpolated value is escaped.

use crate::dom::{escape, Fragment};
use crate::record::Record;

/// Escaped, trimmed field text; `None` when blank.
fn field(r: &Record, name: &str) -> Option<String> {
    let t = r.text(name);
    let t = t.trim();
    (!t.is_empty()).then(|| escape(t))
}

/// Keeps relative and http(s) links; anything else (`javascript:` etc.) becomes `#`.
fn safe_url(r: &Record, name: &str) -> Option<String> {
    let raw = r.text(name);
    let raw = raw.trim();
    if raw.is_empty() { return None; }
    let scheme = raw.split_once(':').map(|(s, _)| s.to_ascii_lowercase());
    let allowed = match scheme {
        Some(s) if s.contains('/') || s.contains('?') || s.contains('#') => true,
        Some(s) => s == "http" || s == "https",
        None => true,
    };
    Some(if allowed { escape(raw) } else { "#".to_string() })
}

fn image(r: &Record, name: &str, alt: &str, class: &str) -> String {
    safe_url(r, name)
        .map(|src| format!("<img class=\"{class}\" src=\"{src}\" alt=\"{alt}\" loading=\"lazy\">"))
        .unwrap_or_default()
}

pub fn breaking_news_item(r: &Record) -> Fragment {
    let title = field(r, "titulo").unwrap_or_default();
    let badge = field(r, "badge").map(|b| format!("<span class=\"badge\">{b}</span> ")).unwrap_or_default();
    let body = match safe_url(r, "enlace") {
        Some(href) => format!("<a href=\"{href}\">{title}</a>"),
        None => format!("<span>{title}</span>"),
    };
    Fragment::raw(format!("<li class=\"breaking-item\">{badge}{body}</li>"))
}

pub fn analysis_card(r: &Record) -> Fragment {
    let title = field(r, "titulo").unwrap_or_default();
    let img = image(r, "imagen", &title, "analysis-image");
    let summary = field(r, "resumen").map(|s| format!("<p class=\"summary\">{s}</p>")).unwrap_or_default();
    let mut byline = field(r, "autor").map(|a| format!("Por {a}")).unwrap_or_default();
    if let Some(date) = field(r, "fecha") {
        if !byline.is_empty() { byline.push_str(" · "); }
        byline.push_str(&format!("<time datetime=\"{date}\">{date}</time>"));
    }
    let byline = if byline.is_empty() { String::new() } else { format!("<p class=\"byline\">{byline}</p>") };
    Fragment::raw(format!("<article class=\"analysis-card\">{img}<h3>{title}</h3>{summary}{byline}</article>"))
}

fn media_label(kind: &str) -> &'static str {
    match kind.to_ascii_lowercase().as_str() {
        "video" => "Vídeo",
        "galeria" | "galería" => "Galería",
        "podcast" | "audio" => "Podcast",
        _ => "Multimedia",
    }
}

pub fn multimedia_card(r: &Record) -> Fragment {
    let title = field(r, "titulo").unwrap_or_default();
    let kind = r.text("tipo");
    let label = media_label(kind.trim());
    let class = label.to_lowercase().replace('í', "i");
    let thumb = image(r, "miniatura", &title, "media-thumb");
    let inner = format!("{thumb}<h3>{title}</h3>");
    let link = match safe_url(r, "url") {
        Some(href) => format!("<a href=\"{href}\">{inner}</a>"),
        None => inner,
    };
    Fragment::raw(format!(
        "<article class=\"media-card media-{class}\">{link}<span class=\"media-type\">{label}</span></article>"
    ))
}

pub fn event_card(r: &Record) -> Fragment {
    let title = field(r, "titulo").unwrap_or_default();
    let date = field(r, "fecha").map(|d| format!("<time datetime=\"{d}\">{d}</time>")).unwrap_or_default();
    let place = [field(r, "lugar"), field(r, "deporte")].into_iter().flatten().collect::<Vec<_>>().join(" · ");
    let place = if place.is_empty() { String::new() } else { format!("<p class=\"event-place\">{place}</p>") };
    let desc = field(r, "descripcion").map(|d| format!("<p>{d}</p>")).unwrap_or_default();
    Fragment::raw(format!("<article class=\"event-card\">{date}<h3>{title}</h3>{place}{desc}</article>"))
}

pub fn athlete_card(r: &Record) -> Fragment {
    let name = field(r, "nombre").unwrap_or_default();
    let photo = image(r, "foto", &name, "athlete-photo");
    let meta = [field(r, "deporte"), field(r, "pais")].into_iter().flatten().collect::<Vec<_>>().join(" · ");
    let meta = if meta.is_empty() { String::new() } else { format!("<p class=\"athlete-sport\">{meta}</p>") };
    let bio = field(r, "biografia").map(|b| format!("<p class=\"bio\">{b}</p>")).unwrap_or_default();
    Fragment::raw(format!("<article class=\"athlete-card\">{photo}<h3>{name}</h3>{meta}{bio}</article>"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breaking_item_links_and_badges() {
        let r = Record::new().with("titulo", "Cae el récord").with("badge", "EN VIVO").with("enlace", "/noticias/42");
        assert_eq!(
            breaking_news_item(&r).as_html(),
            "<li class=\"breaking-item\"><span class=\"badge\">EN VIVO</span> <a href=\"/noticias/42\">Cae el récord</a></li>"
        );
        let plain = breaking_news_item(&Record::new().with("titulo", "Sin enlace"));
        assert_eq!(plain.as_html(), "<li class=\"breaking-item\"><span>Sin enlace</span></li>");
    }

    #[test]
    fn script_urls_are_neutralised() {
        let r = Record::new().with("titulo", "x").with("enlace", "JavaScript:alert(1)");
        assert!(breaking_news_item(&r).as_html().contains("href=\"#\""));
        let r = Record::new().with("titulo", "x").with("enlace", "https://diario.example/a?b=1&c=2");
        assert!(breaking_news_item(&r).as_html().contains("href=\"https://diario.example/a?b=1&amp;c=2\""));
    }

    #[test]
    fn analysis_card_skips_blank_parts() {
        let r = Record::new().with("titulo", "Táctica").with("autor", "Marta").with("fecha", "2024-05-01");
        let html = analysis_card(&r).into_html();
        assert!(!html.contains("<img"));
        assert!(!html.contains("summary"));
        assert!(html.contains("<p class=\"byline\">Por Marta · <time datetime=\"2024-05-01\">2024-05-01</time></p>"));
    }

    #[test]
    fn multimedia_card_labels_the_kind() {
        let r = Record::new().with("titulo", "Resumen").with("tipo", "video").with("url", "/v/1").with("miniatura", "/img/v1.jpg");
        let html = multimedia_card(&r).into_html();
        assert!(html.starts_with("<article class=\"media-card media-video\"><a href=\"/v/1\"><img class=\"media-thumb\""));
        assert!(html.contains("<span class=\"media-type\">Vídeo</span>"));
        let other = multimedia_card(&Record::new().with("titulo", "x")).into_html();
        assert!(other.contains("media-multimedia"));
    }

    #[test]
    fn event_and_athlete_cards_join_metadata() {
        let e = Record::new().with("titulo", "Maratón").with("fecha", "2024-10-06").with("lugar", "Valencia").with("deporte", "Atletismo");
        assert!(event_card(&e).as_html().contains("<p class=\"event-place\">Valencia · Atletismo</p>"));
        let a = Record::new().with("nombre", "Ana <Ruiz>").with("deporte", "Natación");
        let html = athlete_card(&a).into_html();
        assert!(html.contains("<h3>Ana &lt;Ruiz&gt;</h3>"));
        assert!(html.contains("<p class=\"athlete-sport\">Natación</p>"));
    }
}
