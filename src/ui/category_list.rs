// ListView setup for the category list
// The SignalListItemFactory drives the adapter: setup creates rows, bind fills
// them by position, unbind resets them for recycling

use gtk4::prelude::*;
use gtk4::{ListItem, ListView, NoSelection, PolicyType, ScrolledWindow, SignalListItemFactory, StringList};
use std::cell::RefCell;
use std::rc::Rc;

use super::category_row::{CategoryRow, CategoryRowFactory};
use super::cover_loader::GtkCoverLoader;
use crate::adapter::CategoryListAdapter;
use crate::models::CategoryRecord;

pub type GtkCategoryAdapter = CategoryListAdapter<CategoryRowFactory, Rc<GtkCoverLoader>>;

type ActivatedCallback = Box<dyn Fn(&CategoryRecord)>;

/// CategoryListView wraps a virtualized GTK ListView over a category adapter.
///
/// The backing model only mirrors the adapter's row count (one name per row);
/// rows are always bound from the adapter by position.
pub struct CategoryListView {
    scrolled_window: ScrolledWindow,
    list_view: ListView,
    model: StringList,
    adapter: Rc<RefCell<GtkCategoryAdapter>>,
    on_activated: Rc<RefCell<Option<ActivatedCallback>>>,
}

fn row_names(records: &[CategoryRecord]) -> Vec<&str> {
    records.iter().map(CategoryRecord::name).collect()
}

impl CategoryListView {
    pub fn new(adapter: GtkCategoryAdapter) -> Self {
        let model = StringList::new(&row_names(adapter.records()));
        let adapter = Rc::new(RefCell::new(adapter));
        let selection_model = NoSelection::new(Some(model.clone()));

        let factory = SignalListItemFactory::new();

        let setup_adapter = Rc::clone(&adapter);
        factory.connect_setup(move |_factory, item| {
            let Some(list_item) = item.downcast_ref::<ListItem>() else {
                return;
            };
            let row = setup_adapter.borrow().create_row_holder(list_item);
            list_item.set_child(Some(&row));
        });

        let bind_adapter = Rc::clone(&adapter);
        factory.connect_bind(move |_factory, item| {
            let Some(list_item) = item.downcast_ref::<ListItem>() else {
                return;
            };
            let Some(row) = list_item.child().and_downcast::<CategoryRow>() else {
                return;
            };
            let position = list_item.position();
            if position == gtk4::INVALID_LIST_POSITION {
                return;
            }

            let adapter = bind_adapter.borrow();
            let position = position as usize;
            if position < adapter.row_count() {
                adapter.bind_row(&row, position);
            } else {
                tracing::warn!(position, rows = adapter.row_count(), "Bind past end of categories");
            }
        });

        factory.connect_unbind(|_factory, item| {
            let Some(list_item) = item.downcast_ref::<ListItem>() else {
                return;
            };
            if let Some(row) = list_item.child().and_downcast::<CategoryRow>() {
                row.reset();
            }
        });

        factory.connect_teardown(|_factory, item| {
            if let Some(list_item) = item.downcast_ref::<ListItem>() {
                list_item.set_child(Option::<&gtk4::Widget>::None);
            }
        });

        let list_view = ListView::new(Some(selection_model), Some(factory));
        list_view.set_single_click_activate(true);
        list_view.add_css_class("category-list");
        list_view.set_hexpand(true);
        list_view.set_vexpand(true);

        let on_activated: Rc<RefCell<Option<ActivatedCallback>>> = Rc::new(RefCell::new(None));

        let activate_adapter = Rc::clone(&adapter);
        let activate_callback = Rc::clone(&on_activated);
        list_view.connect_activate(move |_list_view, position| {
            let record = activate_adapter.borrow().record(position as usize).cloned();
            if let Some(record) = record {
                if let Some(ref callback) = *activate_callback.borrow() {
                    callback(&record);
                }
            }
        });

        let scrolled_window = ScrolledWindow::builder()
            .hscrollbar_policy(PolicyType::Never)
            .vscrollbar_policy(PolicyType::Automatic)
            .kinetic_scrolling(true)
            .child(&list_view)
            .build();
        scrolled_window.set_vexpand(true);

        Self {
            scrolled_window,
            list_view,
            model,
            adapter,
            on_activated,
        }
    }

    /// Get the scrolled window widget to add to the window
    pub fn widget(&self) -> &ScrolledWindow {
        &self.scrolled_window
    }

    pub fn row_count(&self) -> usize {
        self.adapter.borrow().row_count()
    }

    /// Replace all categories. The adapter is updated before the model is
    /// spliced, since splicing rebinds visible rows immediately.
    pub fn set_records(&self, records: Vec<CategoryRecord>) {
        let names: Vec<String> = records.iter().map(|r| r.name().to_string()).collect();
        let change = self.adapter.borrow_mut().replace_records(records);

        let additions: Vec<&str> = names.iter().map(String::as_str).collect();
        self.model.splice(0, change.removed as u32, &additions);
        tracing::debug!(removed = change.removed, added = change.added, "Replaced categories");

        if change.added > 0 {
            self.list_view
                .scroll_to(0, gtk4::ListScrollFlags::NONE, None);
        }
    }

    pub fn connect_category_activated<F>(&self, callback: F)
    where
        F: Fn(&CategoryRecord) + 'static,
    {
        *self.on_activated.borrow_mut() = Some(Box::new(callback));
    }
}
