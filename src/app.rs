use gtk4::prelude::*;
use gtk4::Application;
use std::path::Path;
use std::rc::Rc;

use crate::config::Config;
use crate::ui::MainWindow;

const APP_ID: &str = "com.catshelf.MusicCategories";
const WINDOW_KEY: &str = "main-window";

pub struct CatshelfApp {
    app: Application,
}

impl CatshelfApp {
    pub fn new(config: Config) -> Self {
        let app = Application::builder()
            .application_id(APP_ID)
            .flags(gio::ApplicationFlags::HANDLES_OPEN)
            .build();

        let config = Rc::new(config);

        let activate_config = Rc::clone(&config);
        app.connect_activate(move |app| Self::show_catalog(app, &activate_config, None));

        let open_config = Rc::clone(&config);
        app.connect_open(move |app, files, _hint| {
            let path = files.first().and_then(|f| f.path());
            Self::show_catalog(app, &open_config, path.as_deref());
        });

        Self { app }
    }

    pub fn run(&self) -> i32 {
        self.app.run().into()
    }

    fn show_catalog(app: &Application, config: &Config, catalog: Option<&Path>) {
        // Reuse the existing window when a second catalog is opened.
        let existing = unsafe { app.data::<Rc<MainWindow>>(WINDOW_KEY) };
        if let Some(window) = existing {
            let window = unsafe { window.as_ref() };
            if catalog.is_some() {
                window.load_catalog(catalog);
            }
            window.present();
            return;
        }

        match MainWindow::new(app, config, catalog) {
            Ok(window) => {
                window.present();
                // Keep the window alive by storing it on the Application.
                unsafe {
                    app.set_data(WINDOW_KEY, window);
                }
            }
            Err(err) => {
                tracing::error!(error = ?err, "Failed to create main window");
                app.quit();
            }
        }
    }
}
