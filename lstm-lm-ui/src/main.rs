use std::time::Duration;

use eframe::{egui, Frame};
use egui::Context;

use reqwest::blocking::Client;
use reqwest::Result;
use serde::{Deserialize, Serialize};

const SERVER: &str = "http://127.0.0.1:8000";

#[derive(Serialize)]
struct GenerateBody<'a> {
    prompt: &'a str,
    max_len: i64,
    temperature: f32,
    seed: i64,
}

#[derive(Serialize)]
struct TransliterateBody<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateReply {
    generated: String,
}

#[derive(Deserialize)]
struct TransliterateReply {
    transliterated: String,
}

#[derive(Deserialize)]
struct ErrorReply {
    error: String,
}

/// REST context holding a reusable blocking HTTP client.
struct RESTContext {
    client: Client,
}

impl RESTContext {
    /// Creates a new REST context with a timeout.
    ///
    /// Generation can take a while on large budgets, hence the longer
    /// timeout than a plain lookup would need.
    fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::new(30, 0))
            .build()?;
        Ok(Self { client })
    }

    /// Sends a POST request to `/api/generate/`.
    ///
    /// The server reports rejected parameters as a JSON `error` field,
    /// which is returned as `Ok(Err(message))`.
    fn post_generate(&self, body: &GenerateBody) -> Result<std::result::Result<String, String>> {
        let response = self.client
            .post(format!("{SERVER}/api/generate/"))
            .json(body)
            .send()?;

        if response.status().is_success() {
            Ok(Ok(response.json::<GenerateReply>()?.generated))
        } else {
            let status = response.status();
            match response.json::<ErrorReply>() {
                Ok(reply) => Ok(Err(reply.error)),
                Err(_) => Ok(Err(format!("server answered {status}"))),
            }
        }
    }

    /// Sends a POST request to `/api/transliterate/`.
    fn post_transliterate(&self, text: &str) -> Result<String> {
        let response = self.client
            .post(format!("{SERVER}/api/transliterate/"))
            .json(&TransliterateBody { text })
            .send()?
            .error_for_status()?;

        Ok(response.json::<TransliterateReply>()?.transliterated)
    }
}

/// Global UI state (MUST persist between frames in egui).
struct LanguageModelUI {
    rest: RESTContext,

    transliterate_input: String,
    transliterate_output: String,

    prompt: String,
    temperature: f32,
    max_len: i64,
    seed: i64,
    generated: Option<String>,
}

impl LanguageModelUI {
    /// Initializes the UI with the same defaults as the web front end.
    fn new() -> Result<Self> {
        Ok(Self {
            rest: RESTContext::new()?,

            transliterate_input: String::new(),
            transliterate_output: String::new(),

            prompt: String::new(),
            temperature: 1.0,
            max_len: 20,
            seed: 42,
            generated: None,
        })
    }

    /// Performs the generation request.
    fn generate(&mut self) {
        let body = GenerateBody {
            prompt: &self.prompt,
            max_len: self.max_len,
            temperature: self.temperature,
            seed: self.seed,
        };
        self.generated = Some(match self.rest.post_generate(&body) {
            Ok(Ok(text)) => text,
            Ok(Err(message)) => format!("Error: {message}"),
            Err(e) => format!("Error: {e}"),
        });
    }

    /// Performs the transliteration request.
    fn transliterate(&mut self) {
        self.transliterate_output = match self.rest.post_transliterate(&self.transliterate_input) {
            Ok(text) => text,
            Err(e) => format!("Error: {e}"),
        };
    }
}

impl eframe::App for LanguageModelUI {
    /// UI update loop (called every frame).
    fn update(&mut self, ctx: &Context, _: &mut Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("LSTM Language Model for Nepali Text");
            ui.separator();

            ui.label("English to Nepali transliteration");
            let input = ui.add(
                egui::TextEdit::singleline(&mut self.transliterate_input)
                    .hint_text("Type English text, e.g., hamra"),
            );
            // Live output, like the web front end
            if input.changed() {
                self.transliterate();
            }
            ui.label(format!("Output: {}", self.transliterate_output));

            ui.separator();

            ui.label("Language model generation");
            egui::Grid::new("generation_grid")
                .num_columns(2)
                .spacing([20.0, 6.0])
                .striped(true)
                .show(ui, |ui| {
                    ui.label("Prompt");
                    ui.add(
                        egui::TextEdit::singleline(&mut self.prompt)
                            .hint_text("Enter prompt in Nepali"),
                    );
                    ui.end_row();

                    ui.label("Temperature");
                    ui.add(
                        egui::DragValue::new(&mut self.temperature)
                            .range(0.1..=2.0)
                            .speed(0.1),
                    );
                    ui.end_row();

                    ui.label("Max length");
                    ui.add(
                        egui::DragValue::new(&mut self.max_len)
                            .range(0..=512)
                            .speed(1),
                    );
                    ui.end_row();

                    ui.label("Seed");
                    ui.add(egui::DragValue::new(&mut self.seed).speed(1));
                    ui.end_row();

                    if ui
                        .add_sized([200.0, 40.0], egui::Button::new("Generate"))
                        .clicked()
                    {
                        self.generate();
                    }

                    if let Some(text) = &self.generated {
                        ui.label(format!("Generated: {text}"));
                    } else {
                        ui.label("Click Generate to start");
                    }
                    ui.end_row();
                });
        });
    }
}

/// Application entry point.
fn main() -> eframe::Result {
    env_logger::init();

    // TODO: register a Devanagari font, egui's bundled fonts render Nepali as boxes.
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([520.0, 420.0])
            .with_resizable(true),
        ..Default::default()
    };

    eframe::run_native(
        "lstm-language-model",
        options,
        Box::new(|_| Ok(Box::new(LanguageModelUI::new()?))),
    )
}
