//! Directory listings and their HTML rendering.

use std::net::Ipv4Addr;
use std::path::Path;

use maud::{DOCTYPE, PreEscaped, html};
use serde::{Deserialize, Serialize};

use crate::error::ServeError;
use crate::resolver::join_link;

/// One child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Raw file name
    pub name: String,
    /// Forward-slash path from the served root
    pub path: String,
}

/// Everything a renderer needs to draw an index page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingPayload {
    pub ip: Option<Ipv4Addr>,
    pub port: u16,
    /// Absolute path of the listed directory
    pub directory: String,
    pub subdirectories: Vec<DirectoryEntry>,
}

/// Names of the immediate children of `dir`, sorted by name.
///
/// Names that are not valid UTF-8 are converted lossily, so the link built from
/// such a name does not resolve back to the file and requesting it fails the stat.
pub fn read_entries(dir: &Path) -> Result<Vec<String>, ServeError> {
    let entries = std::fs::read_dir(dir).map_err(|e| ServeError::io(dir, e))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ServeError::io(dir, e))?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();

    Ok(names)
}

/// Pair each child name with its link path under `parent`.
pub fn entries_under(parent: &str, names: Vec<String>) -> Vec<DirectoryEntry> {
    names
        .into_iter()
        .map(|name| DirectoryEntry {
            path: join_link(parent, &name),
            name,
        })
        .collect()
}

/// Turns a listing payload into an HTML page.
pub trait ListingRenderer: Send + Sync {
    fn render(&self, listing: &ListingPayload) -> String;
}

/// Built-in index page.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlListingRenderer;

impl ListingRenderer for HtmlListingRenderer {
    fn render(&self, listing: &ListingPayload) -> String {
        let remote_url = listing
            .ip
            .map(|ip| format!("http://{}:{}/", ip, listing.port));

        let markup = html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    meta name="viewport" content="width=device-width, initial-scale=1";
                    title { (listing.directory) }
                    link rel="icon" href="/favicon.ico";
                    style { (PreEscaped(STYLE)) }
                }
                body {
                    h1 { (listing.directory) }
                    @if let Some(url) = &remote_url {
                        p class="remote" {
                            "Open on another device: "
                            a href=(url) { (url) }
                        }
                    }
                    @if listing.subdirectories.is_empty() {
                        p class="empty" { "This directory is empty." }
                    } @else {
                        ul {
                            @for entry in &listing.subdirectories {
                                li {
                                    a href=(format!("/{}", encode_link(&entry.path))) {
                                        (entry.name)
                                    }
                                }
                            }
                        }
                    }
                }
            }
        };

        markup.into_string()
    }
}

const STYLE: &str = "
body { font-family: system-ui, sans-serif; margin: 2rem; }
h1 { font-size: 1.2rem; word-break: break-all; }
ul { list-style: none; padding: 0; }
li { padding: 0.25rem 0; }
.remote, .empty { color: #666; }
@media (prefers-color-scheme: dark) { body { background: #1e1e1e; color: #ddd; } a { color: #8ab4f8; } }
";

/// Percent-encode each segment, keeping the separators.
fn encode_link(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
