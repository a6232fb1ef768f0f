// Main window for catshelf
// GTK4 ApplicationWindow with the category list and a status line

use anyhow::Result;
use gdk4::Display;
use gtk4::prelude::*;
use gtk4::{
    Align, Application, ApplicationWindow, Box as GtkBox, CssProvider, Label, Orientation,
    STYLE_PROVIDER_PRIORITY_APPLICATION,
};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::category_list::CategoryListView;
use super::category_row::CategoryRowFactory;
use super::cover_loader::GtkCoverLoader;
use crate::adapter::CategoryListAdapter;
use crate::config::Config;
use crate::covers::{CoverCache, CoverPipeline, CoverSettings};
use crate::models::load_catalog;

const ROW_COVER_PX: i32 = 96;
const DEFAULT_WIDTH: i32 = 420;
const DEFAULT_HEIGHT: i32 = 640;

const APP_CSS: &str = r#"
window {
    background-color: #121212;
    color: #e0e0e0;
}

.catalog-title {
    font-size: 18px;
    font-weight: bold;
    padding: 12px 16px 4px 16px;
}

.status-line {
    color: #9a9a9a;
    font-size: 11px;
    padding: 0 16px 8px 16px;
}

.category-list {
    background-color: transparent;
}

.category-row {
    padding: 8px 16px;
}

.category-cover {
    border-radius: 12px;
}

.category-name {
    font-size: 14px;
    font-weight: bold;
}
"#;

fn load_css() {
    let provider = CssProvider::new();
    provider.load_from_string(APP_CSS);

    if let Some(display) = Display::default() {
        gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }
}

fn count_label(count: usize) -> String {
    match count {
        0 => "Catalog is empty".to_string(),
        1 => "1 category".to_string(),
        n => format!("{n} categories"),
    }
}

/// Main window showing one category catalog
pub struct MainWindow {
    window: ApplicationWindow,
    list: Rc<CategoryListView>,
    status: Label,
    default_catalog: Option<PathBuf>,
}

impl MainWindow {
    pub fn new(app: &Application, config: &Config, catalog: Option<&Path>) -> Result<Rc<Self>> {
        load_css();

        let cache = CoverCache::new(config.cover_cache_bytes(), config.disk_cache_dir.clone());
        let pipeline = CoverPipeline::new(CoverSettings::from_config(config), cache)?;
        let loader = GtkCoverLoader::new(pipeline);
        let adapter =
            CategoryListAdapter::new(Vec::new(), CategoryRowFactory::new(ROW_COVER_PX), loader);
        let list = Rc::new(CategoryListView::new(adapter));

        let title = Label::new(Some("Categories"));
        title.set_halign(Align::Start);
        title.add_css_class("catalog-title");

        let status = Label::new(None);
        status.set_halign(Align::Start);
        status.set_ellipsize(gtk4::pango::EllipsizeMode::Middle);
        status.add_css_class("status-line");

        let content = GtkBox::new(Orientation::Vertical, 0);
        content.append(&title);
        content.append(&status);
        content.append(list.widget());

        let window = ApplicationWindow::builder()
            .application(app)
            .title("catshelf")
            .default_width(DEFAULT_WIDTH)
            .default_height(DEFAULT_HEIGHT)
            .child(&content)
            .build();

        let status_for_activation = status.clone();
        list.connect_category_activated(move |record| {
            tracing::info!(name = record.name(), cover = record.cover_url(), "Category activated");
            status_for_activation.set_text(&format!("Selected: {}", record.name()));
        });

        let this = Rc::new(Self {
            window,
            list,
            status,
            default_catalog: config.catalog_path.clone(),
        });
        this.load_catalog(catalog);
        Ok(this)
    }

    /// Show the catalog at `path`, or the configured default when `None`.
    pub fn load_catalog(&self, path: Option<&Path>) {
        let Some(path) = path.or(self.default_catalog.as_deref()) else {
            self.status.set_text("No catalog configured");
            self.list.set_records(Vec::new());
            return;
        };

        match load_catalog(path) {
            Ok(records) => {
                tracing::info!("Loaded catalog from: {} ({} categories)", path.display(), records.len());
                self.status.set_text(&count_label(records.len()));
                self.list.set_records(records);
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to load catalog");
                self.status
                    .set_text(&format!("Could not load {}", path.display()));
                self.list.set_records(Vec::new());
            }
        }
        tracing::debug!(rows = self.list.row_count(), "Category list updated");
    }

    pub fn present(&self) {
        self.window.present();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_label() {
        assert_eq!(count_label(0), "Catalog is empty");
        assert_eq!(count_label(1), "1 category");
        assert_eq!(count_label(12), "12 categories");
    }
}
