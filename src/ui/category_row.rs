// Row widget for one music category: rounded cover next to the category name
// Rows are created unbound and recycled by the ListView across positions

use glib::Object;
use gtk4::prelude::*;
use gtk4::subclass::prelude::*;
use gtk4::{glib, Align, Box as GtkBox, ContentFit, Label, ListItem, Orientation, Picture};

use super::cover_loader::{clear_cover, placeholder_texture};
use crate::adapter::{RowFactory, RowHolder};

mod imp {
    use super::*;

    pub struct CategoryRowInner {
        pub cover: Picture,
        pub name: Label,
    }

    impl Default for CategoryRowInner {
        fn default() -> Self {
            Self {
                cover: Picture::new(),
                name: Label::new(None),
            }
        }
    }

    #[glib::object_subclass]
    impl ObjectSubclass for CategoryRowInner {
        const NAME: &'static str = "CatshelfCategoryRow";
        type Type = super::CategoryRow;
        type ParentType = GtkBox;
    }

    impl ObjectImpl for CategoryRowInner {
        fn constructed(&self) {
            self.parent_constructed();

            let obj = self.obj();
            obj.set_orientation(Orientation::Horizontal);
            obj.set_spacing(12);
            obj.add_css_class("category-row");

            self.cover.set_can_shrink(true);
            self.cover.set_content_fit(ContentFit::Cover);
            self.cover.set_halign(Align::Start);
            self.cover.set_valign(Align::Center);
            self.cover.add_css_class("category-cover");
            self.cover.set_paintable(Some(&placeholder_texture()));

            self.name.set_halign(Align::Start);
            self.name.set_valign(Align::Center);
            self.name.set_hexpand(true);
            self.name.set_xalign(0.0);
            self.name.set_ellipsize(gtk4::pango::EllipsizeMode::End);
            self.name.add_css_class("category-name");

            obj.append(&self.cover);
            obj.append(&self.name);
        }
    }

    impl WidgetImpl for CategoryRowInner {}
    impl BoxImpl for CategoryRowInner {}
}

glib::wrapper! {
    pub struct CategoryRow(ObjectSubclass<imp::CategoryRowInner>)
        @extends GtkBox, gtk4::Widget,
        @implements gtk4::Accessible, gtk4::Buildable, gtk4::ConstraintTarget, gtk4::Orientable;
}

impl CategoryRow {
    pub fn new(cover_px: i32) -> Self {
        let row: Self = Object::builder().build();
        row.imp().cover.set_size_request(cover_px, cover_px);
        row
    }

    /// Prepare for reuse: blank name, placeholder cover, pending load detached.
    pub fn reset(&self) {
        let imp = self.imp();
        imp.name.set_text("");
        clear_cover(&imp.cover);
    }
}

impl RowHolder for CategoryRow {
    type Cover = Picture;

    fn set_name(&self, name: &str) {
        self.imp().name.set_text(name);
    }

    fn cover(&self) -> &Picture {
        &self.imp().cover
    }
}

/// Builds standalone `CategoryRow`s; the list view attaches them to their `ListItem`.
pub struct CategoryRowFactory {
    cover_px: i32,
}

impl CategoryRowFactory {
    pub fn new(cover_px: i32) -> Self {
        Self { cover_px }
    }
}

impl RowFactory for CategoryRowFactory {
    type Parent = ListItem;
    type Holder = CategoryRow;

    fn create_row(&self, _list_item: &ListItem) -> CategoryRow {
        CategoryRow::new(self.cover_px)
    }
}
