use serde_json::json;
use tera::{Context, Tera};
use thiserror::Error;

use crate::adapter::{GenerateError, TextGenerator};
use crate::store::{SimilarRow, TrackRow};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Tera error: {0}")]
    Tera(#[from] tera::Error),
    #[error("generation error: {0}")]
    Generate(#[from] GenerateError),
}

const ANALYZE_TEMPLATE: &str = "analyze";
const SIMILAR_TEMPLATE: &str = "similar";
const FALLBACK_TEMPLATE: &str = "fallback";
const FALLBACK_SIMILAR_TEMPLATE: &str = "fallback_similar";

pub struct Recommender {
    generator: Box<dyn TextGenerator>,
    templates: Tera,
}

impl Recommender {
    pub fn new(generator: Box<dyn TextGenerator>) -> Result<Self, Error> {
        let mut templates = Tera::default();
        templates.add_raw_template(ANALYZE_TEMPLATE, include_str!("prompt/analyze.txt"))?;
        templates.add_raw_template(SIMILAR_TEMPLATE, include_str!("prompt/similar.txt"))?;
        templates.add_raw_template(FALLBACK_TEMPLATE, include_str!("prompt/fallback.txt"))?;
        templates.add_raw_template(
            FALLBACK_SIMILAR_TEMPLATE,
            include_str!("prompt/fallback_similar.txt"),
        )?;

        Ok(Self {
            generator,
            templates,
        })
    }

    pub async fn analyze(&self, songs: &[TrackRow]) -> Result<String, Error> {
        let context = Context::from_value(json!({
            "songs": songs,
        }))?;
        let prompt = self.templates.render(ANALYZE_TEMPLATE, &context)?;
        Ok(self.generator.generate(&prompt).await?)
    }

    pub async fn analyze_similar(
        &self,
        anchor_track: &str,
        songs: &[SimilarRow],
    ) -> Result<String, Error> {
        let context = Context::from_value(json!({
            "anchor_track": anchor_track,
            "songs": songs,
        }))?;
        let prompt = self.templates.render(SIMILAR_TEMPLATE, &context)?;
        Ok(self.generator.generate(&prompt).await?)
    }

    pub async fn fallback_recommend(&self, search_params: &str) -> Result<String, Error> {
        let context = Context::from_value(json!({
            "search_params": search_params,
        }))?;
        let prompt = self.templates.render(FALLBACK_TEMPLATE, &context)?;
        Ok(self.generator.generate(&prompt).await?)
    }

    pub async fn fallback_similar(&self, track_name: &str) -> Result<String, Error> {
        let context = Context::from_value(json!({
            "track_name": track_name,
        }))?;
        let prompt = self.templates.render(FALLBACK_SIMILAR_TEMPLATE, &context)?;
        Ok(self.generator.generate(&prompt).await?)
    }
}
