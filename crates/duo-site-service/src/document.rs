use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::view::escape_html;

pub const GALLERY_MOUNT: &str = "galleria";
pub const CONCERTS_MOUNT: &str = "concerti";
pub const STYLESHEET_PATH: &str = "/assets/gallery.css";

/// Handle to a named section of the page. Views hold one and check it
/// before applying a late fetch result.
#[derive(Debug, Clone)]
pub struct MountPoint {
    id: String,
    attached: Arc<AtomicBool>,
}

impl MountPoint {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
struct Section {
    mount: MountPoint,
    heading: String,
}

/// The page shell: title plus an ordered list of sections.
#[derive(Debug, Clone)]
pub struct Document {
    title: String,
    sections: Vec<Section>,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            sections: Vec::new(),
        }
    }

    pub fn with_section(mut self, id: impl Into<String>, heading: impl Into<String>) -> Self {
        self.sections.push(Section {
            mount: MountPoint {
                id: id.into(),
                attached: Arc::new(AtomicBool::new(true)),
            },
            heading: heading.into(),
        });
        self
    }

    /// The duo's site layout.
    pub fn site() -> Self {
        Self::new("Duo Mazzola")
            .with_section(GALLERY_MOUNT, "Media")
            .with_section(CONCERTS_MOUNT, "Prossimi Concerti")
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// The attached mount point with this id, if any.
    pub fn mount(&self, id: &str) -> Option<MountPoint> {
        self.sections
            .iter()
            .map(|section| &section.mount)
            .find(|mount| mount.id == id && mount.is_attached())
            .cloned()
    }

    /// Tears a section down. Returns false when no attached section has this id.
    pub fn detach(&self, id: &str) -> bool {
        match self.mount(id) {
            Some(mount) => {
                mount.attached.store(false, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    /// Full page. `contents` pairs a mount id with the markup rendered into it;
    /// sections without content render empty, detached ones not at all.
    pub fn render_page(&self, contents: &[(&str, String)]) -> String {
        let title = escape_html(&self.title);

        let attached: Vec<&Section> = self
            .sections
            .iter()
            .filter(|section| section.mount.is_attached())
            .collect();

        let nav: String = attached
            .iter()
            .map(|section| {
                format!(
                    r##"<a class="nav-link" href="#{id}">{heading}</a>"##,
                    id = escape_html(&section.mount.id),
                    heading = escape_html(&section.heading),
                )
            })
            .collect();

        let body: String = attached
            .iter()
            .map(|section| {
                let content = contents
                    .iter()
                    .find(|(id, _)| *id == section.mount.id)
                    .map(|(_, html)| html.as_str())
                    .unwrap_or_default();
                format!(
                    concat!(
                        r#"<section id="{id}" class="section section-{id}"><div class="container">"#,
                        r#"<h2 class="section-title">{heading}</h2>{content}</div></section>"#
                    ),
                    id = escape_html(&section.mount.id),
                    heading = escape_html(&section.heading),
                    content = content,
                )
            })
            .collect();

        format!(
            concat!(
                "<!DOCTYPE html>\n",
                r#"<html lang="it"><head><meta charset="utf-8" />"#,
                r#"<meta name="viewport" content="width=device-width, initial-scale=1" />"#,
                r#"<title>{title}</title><link rel="stylesheet" href="{stylesheet}" /></head>"#,
                r#"<body><header class="navbar"><span class="brand">{title}</span><nav>{nav}</nav></header>"#,
                r#"<main id="main">{body}</main></body></html>"#
            ),
            title = title,
            stylesheet = STYLESHEET_PATH,
            nav = nav,
            body = body,
        )
    }
}
