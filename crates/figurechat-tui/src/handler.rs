use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, Focus};
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key).await?,
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Resize(_, _) => {} // Redraw happens on the next loop iteration
    }

    app.poll_reply();
    app.poll_character();
    Ok(())
}

async fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return Ok(());
    }

    if app.character_form.is_some() {
        handle_character_form(app, key);
        return Ok(());
    }

    match app.focus {
        Focus::Figures => handle_figures(app, key),
        Focus::Input => handle_input(app, key),
    }
    Ok(())
}

fn handle_figures(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('j') | KeyCode::Down => app.figures_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.figures_nav_up(),
        KeyCode::Enter | KeyCode::Char('l') => app.select_highlighted_figure(),
        KeyCode::Char('n') => app.open_character_form(),
        KeyCode::Tab | KeyCode::Char('i') => {
            if app.session.selected_figure().is_some() {
                app.focus = Focus::Input;
            }
        }
        KeyCode::PageUp => app.scroll_chat_up(),
        KeyCode::PageDown => app.scroll_chat_down(),
        _ => {}
    }
}

fn handle_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Tab => {
            app.focus = Focus::Figures;
            return;
        }
        KeyCode::PageUp => {
            app.scroll_chat_up();
            return;
        }
        KeyCode::PageDown => {
            app.scroll_chat_down();
            return;
        }
        _ => {}
    }

    // Input and send are disabled while a reply is pending
    if app.session.is_busy() {
        return;
    }

    match key.code {
        KeyCode::Enter => app.submit_input(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

fn handle_character_form(app: &mut App, key: KeyEvent) {
    let Some(form) = app.character_form.as_mut() else {
        return;
    };
    if form.creating {
        return;
    }

    match key.code {
        KeyCode::Esc => app.close_character_form(),
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => form.toggle_field(),
        KeyCode::Enter => app.start_character_creation(),
        KeyCode::Backspace => {
            form.active_field_mut().pop();
        }
        KeyCode::Char(c) => {
            form.active_field_mut().push(c);
            form.error = None;
        }
        _ => {}
    }
}
