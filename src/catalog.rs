use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;

use crate::dom::Fragment;
use crate::editor::{EditorConfig, FieldKind, FieldSpec};
use crate::loader::{LoaderConfig, Predicate, Template};
use crate::templates;

/// Flag that selects the records shown on featured pages.
pub const FEATURED_FIELD: &str = "destacado";

/// The content types managed by the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    BreakingNews,
    Analysis,
    Multimedia,
    Events,
    Athletes,
}

/// Read/write URLs for one content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub read: String,
    pub write: String,
}

impl ContentKind {
    pub const ALL: [ContentKind; 5] = [
        ContentKind::BreakingNews,
        ContentKind::Analysis,
        ContentKind::Multimedia,
        ContentKind::Events,
        ContentKind::Athletes,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            ContentKind::BreakingNews => "ultima-hora",
            ContentKind::Analysis => "analisis",
            ContentKind::Multimedia => "multimedia",
            ContentKind::Events => "eventos",
            ContentKind::Athletes => "atletas",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ContentKind::BreakingNews => "Última hora",
            ContentKind::Analysis => "Análisis",
            ContentKind::Multimedia => "Multimedia",
            ContentKind::Events => "Eventos",
            ContentKind::Athletes => "Atletas",
        }
    }

    pub fn default_endpoints(self) -> Endpoints {
        Endpoints { read: format!("data/{}.json", self.slug()), write: format!("api/{}", self.slug()) }
    }

    /// Field the read document nests its array under, if any.
    pub fn collection_field(self) -> Option<&'static str> {
        match self {
            ContentKind::Events => Some("eventos"),
            _ => None,
        }
    }

    pub fn fields(self) -> Vec<FieldSpec> {
        use FieldKind::*;
        match self {
            ContentKind::BreakingNews => vec![
                FieldSpec::new("titulo", "Titular", Text).required(),
                FieldSpec::new("badge", "Etiqueta", Text),
                FieldSpec::new("enlace", "Enlace", Url),
            ],
            ContentKind::Analysis => vec![
                FieldSpec::new("titulo", "Título", Text).required(),
                FieldSpec::new("resumen", "Resumen", LongText).required(),
                FieldSpec::new("autor", "Autor", Text).required(),
                FieldSpec::new("imagen", "Imagen", Url),
                FieldSpec::new("fecha", "Fecha", Date),
                FieldSpec::new(FEATURED_FIELD, "Destacado", Flag),
            ],
            ContentKind::Multimedia => vec![
                FieldSpec::new("titulo", "Título", Text).required(),
                FieldSpec::new("tipo", "Tipo", Text),
                FieldSpec::new("url", "URL", Url).required(),
                FieldSpec::new("miniatura", "Miniatura", Url),
                FieldSpec::new(FEATURED_FIELD, "Destacado", Flag),
            ],
            ContentKind::Events => vec![
                FieldSpec::new("titulo", "Título", Text).required(),
                FieldSpec::new("fecha", "Fecha", Date).required(),
                FieldSpec::new("lugar", "Lugar", Text).required(),
                FieldSpec::new("deporte", "Deporte", Text),
                FieldSpec::new("descripcion", "Descripción", LongText),
            ],
            ContentKind::Athletes => vec![
                FieldSpec::new("nombre", "Nombre", Text).required(),
                FieldSpec::new("deporte", "Deporte", Text).required(),
                FieldSpec::new("pais", "País", Text),
                FieldSpec::new("foto", "Foto", Url),
                FieldSpec::new("biografia", "Biografía", LongText),
            ],
        }
    }

    pub fn template(self) -> Template {
        match self {
            ContentKind::BreakingNews => templates::breaking_news_item,
            ContentKind::Analysis => templates::analysis_card,
            ContentKind::Multimedia => templates::multimedia_card,
            ContentKind::Events => templates::event_card,
            ContentKind::Athletes => templates::athlete_card,
        }
    }

    pub fn fallback(self) -> Fragment {
        let text = match self {
            ContentKind::BreakingNews => "No hay noticias de última hora.",
            ContentKind::Analysis => "No hay análisis disponibles.",
            ContentKind::Multimedia => "No hay contenido multimedia.",
            ContentKind::Events => "No hay eventos programados.",
            ContentKind::Athletes => "No hay perfiles de atletas.",
        };
        Fragment::raw(format!("<p class=\"empty\">{}</p>", crate::dom::escape(text)))
    }

    /// Whether the home page shows a featured-only selection of this type.
    pub fn has_featured(self) -> bool {
        matches!(self, ContentKind::Analysis | ContentKind::Multimedia)
    }

    pub fn editor_config(self, endpoints: &Endpoints) -> EditorConfig {
        EditorConfig {
            name: self.slug().to_string(),
            read_url: endpoints.read.clone(),
            write_url: endpoints.write.clone(),
            collection_field: self.collection_field().map(str::to_string),
            fields: self.fields(),
        }
    }

    pub fn loader_config(self, endpoints: &Endpoints, featured: bool) -> LoaderConfig {
        let mut cfg = LoaderConfig::new(self.slug(), &endpoints.read, self.template(), self.fallback());
        if let Some(field) = self.collection_field() { cfg = cfg.nested(field); }
        if featured { cfg = cfg.filter(Predicate::flag(FEATURED_FIELD)); }
        cfg
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.slug()) }
}

impl FromStr for ContentKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ultima-hora" | "ultimahora" | "breaking" => Ok(Self::BreakingNews),
            "analisis" | "analysis" => Ok(Self::Analysis),
            "multimedia" | "media" => Ok(Self::Multimedia),
            "eventos" | "events" => Ok(Self::Events),
            "atletas" | "athletes" => Ok(Self::Athletes),
            other => Err(anyhow!(
                "unknown content kind `{}` (expected ultima-hora, analisis, multimedia, eventos, atletas)",
                other
            )),
        }
    }
}
