use crate::config::{self, ResolvedField, Settings};
use crate::getter::{CustomGetter, DataMode, DataTarget};
use crate::logging::LogHandle;
use crate::navigator::{Cycle, PopupView};
use crate::session::{ActiveSlot, AnchorField, Session};
use crate::{LoadedData, statics};
use eframe::egui;
use egui_extras::{Column, TableBuilder};
use std::{ops::Range, path::PathBuf, sync::Arc};
use tracing::{error, info};

const DEMO_FIELDS: &str = include_str!("../demos/fields.json5");

pub fn run_gui(
    data: Option<LoadedData>,
    settings: Settings,
    log: Option<LogHandle>,
) -> eframe::Result {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([960.0, 640.0]),
        ..Default::default()
    };
    let title = format!("{} {}", statics::EN_APP_TITLE, env!("CARGO_PKG_VERSION"));
    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| {
            let mut app = AipApp {
                data,
                settings,
                log,
                ..Default::default()
            };
            app.rebuild_fields();
            Ok(Box::new(app))
        }),
    )
}

/// A text input on a demo sheet. Stands in for the host's form field.
#[derive(Debug, Clone)]
struct DemoField {
    key: String,
    label: String,
    config: ResolvedField,
    text: String,
    selection: Range<usize>,
    rect: Option<egui::Rect>,
}

impl AnchorField for DemoField {
    fn text(&self) -> &str {
        &self.text
    }

    fn selection(&self) -> Range<usize> {
        self.selection.clone()
    }

    fn splice(&mut self, range: Range<usize>, insert: &str) {
        self.text.replace_range(range.clone(), insert);
        let cursor = range.start + insert.len();
        self.selection = cursor..cursor;
    }
}

#[derive(Default)]
struct AipApp {
    data: Option<LoadedData>,
    dialog_dir: Option<PathBuf>,
    settings: Settings,
    log: Option<LogHandle>,
    fields: Vec<DemoField>,

    // The open popup, the field it belongs to and its input buffer.
    slot: ActiveSlot,
    active_field: Option<usize>,
    popup_input: String,
    popup_request_focus: bool,
    popup_rect: Option<egui::Rect>,

    status: String,
    last_error: Option<String>,
}

fn field_id(index: usize) -> egui::Id {
    egui::Id::new(("aip_field", index))
}

fn popup_input_id() -> egui::Id {
    egui::Id::new("aip_popup_input")
}

fn char_to_byte(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map_or(text.len(), |(byte, _)| byte)
}

/// Custom getter used by `custom` demo fields: just the `system` part of the document.
fn system_data_getter() -> CustomGetter {
    Arc::new(|target: &dyn DataTarget| target.document_data()?.get("system").cloned())
}

/// Removes a pending `@` keystroke so it opens the popup instead of being typed.
fn take_hotkey(ctx: &egui::Context) -> bool {
    ctx.input_mut(|i| {
        let before = i.events.len();
        i.events
            .retain(|e| !matches!(e, egui::Event::Text(t) if t == statics::HOTKEY_CHAR));
        i.events.len() != before
    })
}

/// ArrowUp steps forward through the candidates, ArrowDown backward.
fn arrow_cycle(key: egui::Key) -> Option<Cycle> {
    match key {
        egui::Key::ArrowUp => Some(Cycle::Forward),
        egui::Key::ArrowDown => Some(Cycle::Backward),
        _ => None,
    }
}

fn move_cursor_to_end(ctx: &egui::Context, id: egui::Id, text: &str) {
    if let Some(mut state) = egui::TextEdit::load_state(ctx, id) {
        let end = egui::text::CCursor::new(text.chars().count());
        state
            .cursor
            .set_char_range(Some(egui::text::CCursorRange::one(end)));
        state.store(ctx, id);
    }
}

impl AipApp {
    /// Re-reads the demo field configuration, keeping typed text and the open popup when
    /// its field still exists.
    fn rebuild_fields(&mut self) {
        let packages = match config::parse_package_configs(DEMO_FIELDS) {
            Ok(packages) => packages,
            Err(e) => {
                error!("demo field configuration: {e}");
                self.last_error = Some(e.to_string());
                return;
            }
        };

        let mut fields = Vec::new();
        for package in &packages {
            for sheet in &package.sheet_classes {
                for field_config in &sheet.field_configs {
                    let key = format!("{}.{}", sheet.name, field_config.selector);
                    let resolved = match field_config.normalize() {
                        Ok(resolved) => resolved,
                        Err(e) => {
                            error!(%key, "skipping field: {e}");
                            continue;
                        }
                    };
                    let resolved = if resolved.getter.mode() == DataMode::Custom {
                        resolved.with_custom_getter(system_data_getter())
                    } else {
                        resolved
                    };

                    let text = self
                        .fields
                        .iter()
                        .find(|f| f.key == key)
                        .map(|f| f.text.clone())
                        .unwrap_or_default();
                    let end = text.len();
                    fields.push(DemoField {
                        label: format!("{} ({})", key, resolved.getter.mode()),
                        key,
                        config: resolved,
                        text,
                        selection: end..end,
                        rect: None,
                    });
                }
            }
        }
        self.fields = fields;

        let kept = self.fields.iter().any(|f| self.slot.retarget(&f.key));
        if !kept {
            self.close_popup();
        }
        self.active_field = self
            .slot
            .current()
            .and_then(|s| self.fields.iter().position(|f| f.key == s.target_key()));
        info!(count = self.fields.len(), "fields registered");
    }

    fn file_dialog(&self) -> rfd::FileDialog {
        let mut dlg = rfd::FileDialog::new().add_filter("Data snapshot", &["json", "json5", "gz"]);
        if let Some(dir) = self.dialog_dir.clone() {
            dlg = dlg.set_directory(dir);
        }
        dlg
    }

    fn open_file(&mut self) {
        let Some(path) = self.file_dialog().pick_file() else {
            return;
        };

        match LoadedData::load_path(&path) {
            Ok(data) => {
                self.dialog_dir = path.parent().map(PathBuf::from);
                self.status = format!("Loaded {}", path.display());
                self.close_popup();
                self.data = Some(data);
                self.last_error = None;
            }
            Err(e) => {
                self.last_error = Some(format!("Failed to load: {e:#}"));
            }
        }
    }

    fn activate(&mut self, index: usize) {
        let Some(data) = self.data.as_ref() else {
            self.last_error = Some(statics::EN_HOME_INSTRUCTIONS.to_string());
            return;
        };
        let Some(field) = self.fields.get(index) else {
            return;
        };

        match Session::open(&data.entity, field.key.clone(), &field.config) {
            Some(session) => {
                self.popup_input = session.navigator().raw_path().to_string();
                self.slot.activate(session);
                self.active_field = Some(index);
                self.popup_request_focus = true;
                self.last_error = None;
            }
            None => {
                self.close_popup();
                self.last_error = Some(statics::EN_NO_DATA_FOR_FIELD.to_string());
            }
        }
    }

    fn close_popup(&mut self) {
        self.slot.close();
        self.active_field = None;
        self.popup_rect = None;
    }

    /// Mirrors the navigator's path into the popup input after a navigation command.
    fn sync_popup_input(&mut self, ctx: &egui::Context) {
        let Some(session) = self.slot.current() else {
            return;
        };
        self.popup_input = session.navigator().raw_path().to_string();
        move_cursor_to_end(ctx, popup_input_id(), &self.popup_input);
        self.popup_request_focus = true;
    }

    fn confirm(&mut self, ctx: &egui::Context, index: usize) {
        let Some(field) = self.fields.get_mut(index) else {
            self.close_popup();
            return;
        };
        if let Some(inserted) = self.slot.confirm_into(field) {
            self.status = format!("Inserted \"{}\"", inserted.trim());
            let cursor = field.text[..field.selection.end].chars().count();
            if let Some(mut state) = egui::TextEdit::load_state(ctx, field_id(index)) {
                state.cursor.set_char_range(Some(egui::text::CCursorRange::one(
                    egui::text::CCursor::new(cursor),
                )));
                state.store(ctx, field_id(index));
            }
        }
        self.close_popup();
        ctx.memory_mut(|m| m.request_focus(field_id(index)));
    }

    fn render_fields(&mut self, ui: &mut egui::Ui) {
        let mut summon = None;
        let show_buttons = self.settings.show_button;

        for (index, field) in self.fields.iter_mut().enumerate() {
            let id = field_id(index);
            let focused = ui.memory(|m| m.has_focus(id));
            if focused && field.config.allow_hotkey && take_hotkey(ui.ctx()) {
                summon = Some(index);
            }

            ui.horizontal(|ui| {
                ui.add_sized([240.0, 18.0], egui::Label::new(&field.label).truncate());
                let output = egui::TextEdit::singleline(&mut field.text)
                    .id(id)
                    .desired_width(360.0)
                    .show(ui);
                if let Some(range) = output.cursor_range {
                    let a = char_to_byte(&field.text, range.primary.index);
                    let b = char_to_byte(&field.text, range.secondary.index);
                    field.selection = a.min(b)..a.max(b);
                }
                field.rect = Some(output.response.rect);

                if show_buttons
                    && field.config.show_button
                    && ui.small_button(statics::EN_BTN_SUMMON).clicked()
                {
                    summon = Some(index);
                }
            });
        }

        if let Some(index) = summon {
            self.activate(index);
        }
    }

    fn render_candidates(ui: &mut egui::Ui, view: &PopupView, chosen: &mut Option<String>) {
        if view.entries.is_empty() {
            ui.label(statics::EN_NO_CANDIDATES);
            return;
        }

        let row_h = ui.text_style_height(&egui::TextStyle::Body) + 6.0;
        TableBuilder::new(ui)
            .striped(true)
            .sense(egui::Sense::click())
            .max_scroll_height(260.0)
            .scroll_to_row(view.highlighted, None)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::initial(240.0).resizable(true))
            .column(Column::remainder().resizable(true))
            .header(row_h, |#[allow(unused_mut)] mut header| {
                header.col(|ui| {
                    ui.strong(statics::EN_COL_KEY);
                });
                header.col(|ui| {
                    ui.strong(statics::EN_COL_VALUE);
                });
            })
            .body(|#[allow(unused_mut)] mut body| {
                body.rows(row_h, view.entries.len(), |mut row| {
                    let index = row.index();
                    let entry = &view.entries[index];
                    row.set_selected(index == view.highlighted);

                    row.col(|ui| {
                        let (matched, rest) = entry.split_key();
                        ui.spacing_mut().item_spacing.x = 0.0;
                        ui.label(
                            egui::RichText::new(matched)
                                .monospace()
                                .strong()
                                .color(ui.visuals().hyperlink_color),
                        );
                        ui.monospace(rest);
                    });
                    row.col(|ui| {
                        ui.monospace(&entry.value);
                    });

                    if row.response().clicked() {
                        *chosen = Some(entry.key.clone());
                    }
                });
            });
    }

    fn render_popup(&mut self, ctx: &egui::Context) {
        let Some(field_index) = self.active_field else {
            return;
        };
        if !self.slot.is_open() {
            self.active_field = None;
            return;
        }

        // Navigation keys belong to the popup while it is open.
        let (arrows, tab, enter, escape) = ctx.input_mut(|i| {
            let arrows: Vec<Cycle> = [egui::Key::ArrowUp, egui::Key::ArrowDown]
                .into_iter()
                .filter(|key| i.consume_key(egui::Modifiers::NONE, *key))
                .filter_map(arrow_cycle)
                .collect();
            (
                arrows,
                i.consume_key(egui::Modifiers::NONE, egui::Key::Tab),
                i.consume_key(egui::Modifiers::NONE, egui::Key::Enter),
                i.consume_key(egui::Modifiers::NONE, egui::Key::Escape),
            )
        });

        let mut sync = false;
        if let Some(session) = self.slot.current_mut() {
            for direction in arrows {
                session.on_cycle(direction);
            }
            if tab {
                if let Err(e) = session.on_descend() {
                    self.last_error = Some(e.to_string());
                }
                sync = true;
            }
        }
        if sync {
            self.sync_popup_input(ctx);
        }

        let Some(view) = self.slot.current().map(Session::view) else {
            return;
        };
        let anchor = self
            .fields
            .get(field_index)
            .and_then(|f| f.rect)
            .map(|r| r.left_bottom() + egui::vec2(0.0, 4.0))
            .unwrap_or_default();

        let mut back = false;
        let mut insert = false;
        let mut text_changed = false;
        let mut chosen = None;

        let shown = egui::Window::new(statics::EN_APP_TITLE)
            .id(egui::Id::new("aip_popup"))
            .title_bar(false)
            .collapsible(false)
            .resizable(false)
            .fixed_pos(anchor)
            .show(ctx, |ui| {
                ui.set_min_width(360.0);
                ui.horizontal(|ui| {
                    if ui.button(statics::EN_BTN_BACK).clicked() {
                        back = true;
                    }
                    ui.monospace(&view.key_prefix);
                    let resp = ui.add(
                        egui::TextEdit::singleline(&mut self.popup_input)
                            .id(popup_input_id())
                            .font(egui::TextStyle::Monospace)
                            .desired_width(240.0),
                    );
                    if self.popup_request_focus {
                        resp.request_focus();
                        self.popup_request_focus = false;
                    }
                    text_changed = resp.changed();
                    if ui.button(statics::EN_BTN_INSERT).clicked() {
                        insert = true;
                    }
                });
                ui.separator();
                Self::render_candidates(ui, &view, &mut chosen);
            });
        if let Some(shown) = &shown {
            self.popup_rect = Some(shown.response.rect);
        }

        let mut sync = false;
        if let Some(session) = self.slot.current_mut() {
            if text_changed {
                session.on_text_changed(self.popup_input.clone());
            }
            if back {
                session.on_ascend();
                sync = true;
            }
            if let Some(key) = chosen {
                session.on_choose(&key);
                sync = true;
            }
        }
        if sync {
            self.sync_popup_input(ctx);
        }

        let clicked_outside = self.popup_rect.is_some_and(|rect| {
            ctx.input(|i| {
                i.pointer.any_pressed()
                    && i.pointer.interact_pos().is_some_and(|p| !rect.contains(p))
            })
        });

        if enter || insert {
            self.confirm(ctx, field_index);
        } else if escape || clicked_outside {
            self.close_popup();
        }
    }
}

impl eframe::App for AipApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                if ui.button(statics::EN_BTN_OPEN).clicked() {
                    self.open_file();
                }
                if ui.button(statics::EN_BTN_RELOAD_FIELDS).clicked() {
                    self.rebuild_fields();
                }
            });
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(err) = &self.last_error {
                    ui.colored_label(ui.visuals().error_fg_color, err);
                } else {
                    ui.label(&self.status);
                }
            });
        });

        egui::SidePanel::right("settings_panel").show(ctx, |ui| {
            ui.heading(statics::EN_HEADING_SETTINGS);
            ui.checkbox(&mut self.settings.show_button, statics::EN_SETTING_SHOW_BUTTON)
                .on_hover_text(statics::EN_SETTING_SHOW_BUTTON_HINT);
            let debug_changed = ui
                .checkbox(&mut self.settings.debug, statics::EN_SETTING_DEBUG)
                .on_hover_text(statics::EN_SETTING_DEBUG_HINT)
                .changed();
            if debug_changed && let Some(log) = &self.log {
                log.apply(&self.settings);
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(statics::EN_HEADING_FIELDS);
            if self.data.is_none() {
                ui.label(statics::EN_HOME_INSTRUCTIONS);
            }
            ui.separator();
            self.render_fields(ui);
        });

        self.render_popup(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::{AipApp, DemoField, arrow_cycle, char_to_byte};
    use crate::Cycle;
    use crate::session::AnchorField;
    use eframe::egui;
    use crate::{DataValue, LoadedData};

    fn app_with_data() -> AipApp {
        let root = DataValue::parse_json5(include_str!("../demos/hero.json5")).unwrap();
        let mut app = AipApp {
            data: Some(LoadedData::from_value(root)),
            ..Default::default()
        };
        app.rebuild_fields();
        app
    }

    fn field_index(app: &AipApp, key: &str) -> usize {
        app.fields.iter().position(|f| f.key == key).unwrap()
    }

    #[test]
    fn char_to_byte_handles_multibyte_text() {
        assert_eq!(char_to_byte("héllo", 2), 3);
        assert_eq!(char_to_byte("abc", 10), 3);
    }

    #[test]
    fn arrow_keys_cycle_up_forward_and_down_backward() {
        assert_eq!(arrow_cycle(egui::Key::ArrowUp), Some(Cycle::Forward));
        assert_eq!(arrow_cycle(egui::Key::ArrowDown), Some(Cycle::Backward));
        assert_eq!(arrow_cycle(egui::Key::Tab), None);

        let mut app = app_with_data();
        app.activate(field_index(&app, "ActorSheet.formula"));
        let session = app.slot.current_mut().unwrap();
        let last = session.view().entries.len() - 1;
        assert_eq!(session.on_cycle(arrow_cycle(egui::Key::ArrowDown).unwrap()), Some(last));
    }

    #[test]
    fn demo_fields_register_from_config() {
        let app = app_with_data();
        assert_eq!(app.fields.len(), 5);
        let legacy: &DemoField = &app.fields[field_index(&app, "ActorSheet.legacy")];
        assert!(!legacy.config.show_button);
        assert_eq!(legacy.config.session.key_prefix(), "$");
    }

    #[test]
    fn activate_opens_session_with_default_path() {
        let mut app = app_with_data();
        let index = field_index(&app, "ItemSheet.item-bonus");
        app.activate(index);
        assert_eq!(app.active_field, Some(index));
        assert_eq!(app.popup_input, "abilities.");

        let index = field_index(&app, "ItemSheet.system-only");
        app.activate(index);
        let view = app.slot.current().unwrap().view();
        assert!(view.entries.iter().any(|e| e.key == "weight"));
        assert_eq!(view.key_prefix, "&");
    }

    #[test]
    fn rebuild_keeps_popup_for_same_field() {
        let mut app = app_with_data();
        let index = field_index(&app, "ActorSheet.formula");
        app.fields[index].text = "1d20 +".to_string();
        app.activate(index);
        app.rebuild_fields();
        assert!(app.slot.is_open());
        assert_eq!(app.active_field, Some(index));
        assert_eq!(app.fields[index].text(), "1d20 +");
    }

    #[test]
    fn formula_field_hides_filtered_keys() {
        let mut app = app_with_data();
        app.activate(field_index(&app, "ActorSheet.formula"));
        let view = app.slot.current().unwrap().view();
        assert!(view.entries.iter().all(|e| !e.key.starts_with("flags")));
        assert_eq!(view.key_prefix, "@");
    }
}
