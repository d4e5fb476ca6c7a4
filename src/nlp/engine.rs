//! spaCy pipeline embedded through an in-process Python interpreter.
//!
//! The model is loaded once at startup and held for the life of the process.
//! Everything read back from Python is converted into [`ParsedDoc`] right at
//! the boundary; nothing downstream touches Python objects. spaCy reports
//! character offsets, so the extraction also rebases every span onto byte
//! offsets of the submitted text.

use anyhow::{Context, Result};
use log::{info, warn};
use pyo3::prelude::*;

use crate::error::ServiceError;
use crate::nlp::doc::{NounChunk, ParsedDoc, RawEntity, Token};

pub struct SpacyEngine {
    model_name: String,
    pipe_names: Vec<String>,
    nlp: PyObject,
}

impl SpacyEngine {
    /// Loads the named spaCy pipeline. Called once at process start; a
    /// failure here leaves the service in degraded mode.
    pub fn load(model_name: &str) -> Result<Self> {
        Python::with_gil(|py| {
            let spacy = py
                .import("spacy")
                .context("spaCy is not importable in the embedded Python environment")?;
            let nlp = spacy
                .call_method1("load", (model_name,))
                .with_context(|| format!("failed to load spaCy model '{model_name}'"))?;
            let pipe_names: Vec<String> = nlp
                .getattr("pipe_names")
                .and_then(|names| names.extract())
                .unwrap_or_default();
            info!("spaCy model '{model_name}' loaded, pipeline: {pipe_names:?}");
            Ok(Self {
                model_name: model_name.to_string(),
                pipe_names,
                nlp: nlp.into(),
            })
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn pipe_names(&self) -> &[String] {
        &self.pipe_names
    }

    /// Runs the pipeline over `text`. Serialized process-wide by the Python
    /// GIL; callers that need exclusivity add the inference gate on top.
    pub fn parse(&self, text: &str) -> Result<ParsedDoc, ServiceError> {
        Python::with_gil(|py| {
            let doc = self.nlp.bind(py).call1((text,))?;
            let parsed = extract_doc(&doc, text)?;
            Ok(parsed)
        })
    }
}

fn extract_doc(doc: &Bound<'_, PyAny>, text: &str) -> PyResult<ParsedDoc> {
    let offsets = byte_offsets(text);

    let mut tokens = Vec::new();
    for token in doc.try_iter()? {
        let token = token?;
        let token_text: String = token.getattr("text")?.extract()?;
        let idx: usize = token.getattr("idx")?.extract()?;
        let start = byte_at(&offsets, idx);
        let end = byte_at(&offsets, idx + token_text.chars().count());
        tokens.push(Token {
            lemma: token.getattr("lemma_")?.extract()?,
            pos: token.getattr("pos_")?.extract()?,
            dep: token.getattr("dep_")?.extract()?,
            is_alpha: token.getattr("is_alpha")?.extract()?,
            is_stop: token.getattr("is_stop")?.extract()?,
            text: token_text,
            start,
            end,
        });
    }

    let mut entities = Vec::new();
    for ent in doc.getattr("ents")?.try_iter()? {
        let ent = ent?;
        let start: usize = ent.getattr("start_char")?.extract()?;
        let end: usize = ent.getattr("end_char")?.extract()?;
        entities.push(RawEntity {
            text: ent.getattr("text")?.extract()?,
            label: ent.getattr("label_")?.extract()?,
            start: byte_at(&offsets, start),
            end: byte_at(&offsets, end),
        });
    }

    // `sents` and `noun_chunks` raise when the pipeline lacks the relevant
    // component; treat that as "none" rather than failing the request.
    let mut sentence_count = 0;
    match doc.getattr("sents").and_then(|s| s.try_iter()) {
        Ok(sents) => {
            for sent in sents {
                if sent.is_err() {
                    break;
                }
                sentence_count += 1;
            }
        }
        Err(e) => warn!("Pipeline produced no sentence boundaries: {e}"),
    }

    let mut noun_chunks = Vec::new();
    match doc.getattr("noun_chunks").and_then(|c| c.try_iter()) {
        Ok(chunks) => {
            for chunk in chunks {
                let Ok(chunk) = chunk else { break };
                let start: usize = chunk.getattr("start_char")?.extract()?;
                let end: usize = chunk.getattr("end_char")?.extract()?;
                noun_chunks.push(NounChunk {
                    text: chunk.getattr("text")?.extract()?,
                    start: byte_at(&offsets, start),
                    end: byte_at(&offsets, end),
                });
            }
        }
        Err(e) => warn!("Pipeline produced no noun chunks: {e}"),
    }

    Ok(ParsedDoc {
        tokens,
        sentence_count,
        noun_chunks,
        entities,
    })
}

/// Byte offset of every char index, plus a sentinel for the text end.
fn byte_offsets(text: &str) -> Vec<usize> {
    let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    offsets.push(text.len());
    offsets
}

fn byte_at(offsets: &[usize], char_index: usize) -> usize {
    offsets
        .get(char_index)
        .or(offsets.last())
        .copied()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_offsets_handle_multibyte_text() {
        // "é" is two bytes; char index 2 starts at byte 3.
        let offsets = byte_offsets("hét");
        assert_eq!(byte_at(&offsets, 0), 0);
        assert_eq!(byte_at(&offsets, 1), 1);
        assert_eq!(byte_at(&offsets, 2), 3);
        assert_eq!(byte_at(&offsets, 3), 4);
        // Past-the-end indices clamp to the text length.
        assert_eq!(byte_at(&offsets, 10), 4);
    }

    #[test]
    fn byte_offsets_of_empty_text() {
        let offsets = byte_offsets("");
        assert_eq!(byte_at(&offsets, 0), 0);
        assert_eq!(byte_at(&offsets, 5), 0);
    }
}
