#![allow(dead_code)]

use doc_analyzer_lib::llm::{LanguageModel, LlmError};
use lopdf::dictionary;
use lopdf::{Document, Object, Stream};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Build a PDF with one page per entry. An empty entry produces a page with
/// an empty content stream, like a scanned page without a text layer.
pub fn make_pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = if text.is_empty() {
            String::new()
        } else {
            format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET")
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages.len() as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Replays canned answers in order and records every prompt it was given.
#[derive(Default)]
pub struct ScriptedModel {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|r| r.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl LanguageModel for ScriptedModel {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(LlmError::EmptyResponse)
    }
}

pub const AMOUNT_MISSING_RESPONSE: &str = r#"Here is the result: [{"field":"amount","status":"MISSING","value":"","priority":"critical","recommendation":"add total"}] Thanks"#;
