// Text rendering of the visible part of the page

use std::fmt::Write;

use super::page::{ElementId, InputType, Page};

/// Banners with the view they belong to
const BANNERS: [(ElementId, ElementId, char); 4] = [
    (ElementId::LoginError, ElementId::LoginView, '!'),
    (ElementId::SignupError, ElementId::SignupView, '!'),
    (ElementId::TranscriptResult, ElementId::Dashboard, '✓'),
    (ElementId::TranscriptError, ElementId::Dashboard, '!'),
];

pub fn render(page: &Page) -> String {
    let mut out = String::new();

    if page.is_visible(ElementId::LoginView) {
        section(&mut out, "Kirjaudu sisään");
        field(&mut out, page, "Sähköposti", ElementId::LoginEmail);
        field(&mut out, page, "Salasana", ElementId::LoginPassword);
        toggle(&mut out, page, ElementId::ToggleLoginPassword, "toggle-password login");
        button(&mut out, page, ElementId::LoginButton, "Kirjaudu", "login <email> <salasana>");
        banner(&mut out, page, ElementId::LoginError, '!');
        line(&mut out, "Ei tiliä? show-signup");
    }

    if page.is_visible(ElementId::SignupView) {
        section(&mut out, "Luo tili");
        field(&mut out, page, "Sähköposti", ElementId::SignupEmail);
        field(&mut out, page, "Salasana", ElementId::SignupPassword);
        toggle(&mut out, page, ElementId::ToggleSignupPassword, "toggle-password signup");
        button(&mut out, page, ElementId::SignupButton, "Rekisteröidy", "signup <email> <salasana>");
        banner(&mut out, page, ElementId::SignupError, '!');
        line(&mut out, "Onko sinulla jo tili? show-login");
    }

    if page.is_visible(ElementId::Dashboard) {
        section(&mut out, "Transkriptio");
        line(&mut out, &format!("Kirjautunut: {}", page.text(ElementId::UserEmail)));
        field(&mut out, page, "YouTube-osoite", ElementId::YoutubeUrl);
        if page.get(ElementId::OutputBasename).is_some() {
            field(&mut out, page, "Tiedostonimi", ElementId::OutputBasename);
        }
        button(&mut out, page, ElementId::TranscriptButton, "Luo transkriptio", "transcript <url> [nimi]");
        banner(&mut out, page, ElementId::TranscriptResult, '✓');
        banner(&mut out, page, ElementId::TranscriptError, '!');
        line(&mut out, "Kirjaudu ulos: logout");
    }

    // a session change can hide a view while its banner is still up
    for (id, view, marker) in BANNERS {
        if !page.is_visible(view) {
            banner(&mut out, page, id, marker);
        }
    }

    out
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "== {} ==", title);
}

fn line(out: &mut String, text: &str) {
    let _ = writeln!(out, "  {}", text);
}

fn field(out: &mut String, page: &Page, label: &str, id: ElementId) {
    let Some(element) = page.get(id) else {
        return;
    };
    let shown = match element.input_type {
        InputType::Password => "•".repeat(element.value.chars().count()),
        InputType::Text => element.value.clone(),
    };
    let _ = writeln!(out, "  {}: {}", label, shown);
}

fn toggle(out: &mut String, page: &Page, id: ElementId, command: &str) {
    if let Some(label) = page.get(id).and_then(|e| e.aria_label.as_deref()) {
        let _ = writeln!(out, "  ({}: {})", label, command);
    }
}

fn button(out: &mut String, page: &Page, id: ElementId, label: &str, command: &str) {
    let busy = page.get(id).is_some_and(|e| e.disabled);
    if busy {
        let _ = writeln!(out, "  [{} …]", label);
    } else {
        let _ = writeln!(out, "  [{}] {}", label, command);
    }
}

fn banner(out: &mut String, page: &Page, id: ElementId, marker: char) {
    if page.is_visible(id) {
        let _ = writeln!(out, "  {} {}", marker, page.text(id));
    }
}
