mod api;
mod app_state;
mod config;
mod form;
mod geolocate;
mod log_entry;
mod popup;
mod ui;

use std::{fs::File, sync::Arc};

use api::ApiClient;
use app_state::AppState;
use color_eyre::eyre::{eyre, Result};
use config::Config;
use form::EntryDraft;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use ui::{Action, FormInput, Ui};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let config = Config::load();

    // The TUI owns the terminal, so tracing goes to a file.
    let log_file = File::create(&config.log_file)?;
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_ansi(false)
        .with_writer(Arc::new(log_file))
        .init();
    info!("starting travel log viewer against {}", config.api_url);

    let http = reqwest::Client::new();
    let api = ApiClient::new(http.clone(), &config.api_url)
        .map_err(|e| eyre!("invalid API base URL: {e}"))?;

    let mut state = AppState::new();
    let mut ui = Ui::new(config.backdrop)?;

    refresh_entries(&api, &mut state, &mut ui).await?;

    loop {
        ui.display(&state)?;

        let Some(action) = ui.handle_input(&state)? else {
            continue;
        };
        state.clear_notice();

        match action {
            Action::Quit => break,
            Action::Refresh => refresh_entries(&api, &mut state, &mut ui).await?,
            Action::AddEntryAt {
                latitude,
                longitude,
            } => state.open_pending(latitude, longitude),
            Action::SelectEntry(id) => state.select_entry(&id),
            Action::ClosePopup => state.close_popup(),
            Action::CancelForm => state.close_form(),
            Action::Form(input) => {
                if let Some(draft) = state.draft_mut() {
                    apply_form_input(draft, input);
                }
            }
            Action::SubmitForm => {
                if let Some((api_key, entry)) = state.begin_submit() {
                    ui.display(&state)?;
                    match api.create_entry(&api_key, &entry).await {
                        Ok(created) => {
                            info!(id = %created.id, title = %created.title, "created entry");
                            state.close_form();
                            refresh_entries(&api, &mut state, &mut ui).await?;
                        }
                        Err(e) => {
                            warn!("create rejected: {e}");
                            state.submit_failed(e.to_string());
                        }
                    }
                }
            }
            Action::Pan { d_lon, d_lat } => state.viewport.pan(d_lon, d_lat),
            Action::ZoomIn => state.viewport.zoom_in(),
            Action::ZoomOut => state.viewport.zoom_out(),
            Action::Locate => {
                match geolocate::current_position(&http, &config.geoip_url).await {
                    Ok((latitude, longitude)) => {
                        info!("located at {latitude}, {longitude}");
                        state.locate_succeeded(latitude, longitude);
                    }
                    Err(e) => {
                        warn!("geolocation failed: {e}");
                        state.locate_failed();
                    }
                }
            }
        }
    }

    Ok(())
}

async fn refresh_entries(api: &ApiClient, state: &mut AppState, ui: &mut Ui) -> Result<()> {
    state.loading = true;
    ui.display(state)?;
    match api.list_entries().await {
        Ok(entries) => {
            info!(count = entries.len(), "loaded entries");
            state.set_entries(entries);
        }
        Err(e) => {
            warn!("list failed: {e}");
            state.load_failed();
        }
    }
    state.loading = false;
    Ok(())
}

fn apply_form_input(draft: &mut EntryDraft, input: FormInput) {
    match input {
        FormInput::Insert(c) => draft.insert(c),
        FormInput::Backspace => draft.backspace(),
        FormInput::Delete => draft.delete(),
        FormInput::Left => draft.move_left(),
        FormInput::Right => draft.move_right(),
        FormInput::NextField => draft.next_field(),
        FormInput::PrevField => draft.prev_field(),
        FormInput::RatingUp => draft.rating_up(),
        FormInput::RatingDown => draft.rating_down(),
    }
}
