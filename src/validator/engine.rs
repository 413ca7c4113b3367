//! 校验主引擎
//!
//! 组合词典查询、G2P 预测、相似词推荐，产出单词 / 实体 / 批量结果。
//! 每次调用只取一次模型快照，整个调用都基于这一份词典。

use std::sync::Arc;

use rayon::prelude::*;

use super::entity;
use super::types::{BatchVerdict, ConfidenceTier, EntityVerdict, WordStatus, WordVerdict};
use crate::errors::{ValidatorError, ValidatorResult};
use crate::lexicon::{normalize_word, split_entity_name, LexiconStats};
use crate::model::{ActiveModel, ModelContext};
use crate::suggest::{SimilaritySuggester, Suggestion};

const NO_MODEL_NOTE: &str = "no model selected";

/// 校验阈值
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationConfig {
    /// 相似词分数下限（严格大于）
    pub similarity_floor: f64,
    pub max_suggestions: usize,
    /// G2P 置信度达到该值才算 guessed
    pub usable_guess_threshold: f64,
    /// 实体识别占比低于该值时建议重命名
    pub rename_ratio_threshold: f64,
    /// 批量总分低于该值时建议重命名
    pub batch_rename_score_threshold: f64,
    /// 未识别但有相似词时：置信度 = 最高相似分 × 该系数
    pub similarity_boost: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            similarity_floor: 0.5,
            max_suggestions: 5,
            usable_guess_threshold: 0.5,
            rename_ratio_threshold: 0.5,
            batch_rename_score_threshold: 0.8,
            similarity_boost: 0.3,
        }
    }
}

/// 校验器（无状态，可在线程间共享）
#[derive(Debug, Clone)]
pub struct Validator {
    context: Arc<ModelContext>,
    config: ValidationConfig,
    suggester: SimilaritySuggester,
}

impl Validator {
    pub fn new(context: Arc<ModelContext>, config: ValidationConfig) -> Self {
        let suggester = SimilaritySuggester::new(config.similarity_floor);
        Self {
            context,
            config,
            suggester,
        }
    }

    pub fn context(&self) -> &Arc<ModelContext> {
        &self.context
    }

    /// 校验单个词
    pub fn validate_word(&self, word: &str) -> WordVerdict {
        match self.context.active() {
            Some(model) => self.word_verdict(&model, word),
            None => WordVerdict::error(word, NO_MODEL_NOTE, None),
        }
    }

    /// 校验实体名
    pub fn validate_entity(&self, entity_name: &str) -> EntityVerdict {
        match self.context.active() {
            Some(model) => self.entity_verdict(&model, entity_name),
            None => Self::entity_without_model(entity_name),
        }
    }

    /// 批量校验实体名（输出顺序与输入一致）
    pub fn validate_entities<S: AsRef<str> + Sync>(&self, entities: &[S]) -> BatchVerdict {
        let model = self.context.active();

        let entity_results: Vec<EntityVerdict> = match &model {
            Some(model) => entities
                .par_iter()
                .map(|e| self.entity_verdict(model, e.as_ref()))
                .collect(),
            None => entities
                .iter()
                .map(|e| Self::entity_without_model(e.as_ref()))
                .collect(),
        };

        let model_id = model.as_ref().map(|m| m.info.id.clone());
        self.batch_verdict(model_id, entity_results)
    }

    /// 直接查询相似词
    pub fn suggest_alternatives(&self, word: &str, max_results: usize) -> ValidatorResult<Vec<Suggestion>> {
        let model = self.context.active().ok_or(ValidatorError::NoModelSelected)?;
        let normalized = normalize_word(word);
        if normalized.is_empty() {
            return Err(ValidatorError::InvalidWord {
                word: word.to_string(),
            });
        }
        Ok(self
            .suggester
            .suggest(&normalized, model.lexicon.words(), max_results))
    }

    pub fn stats(&self) -> ValidatorResult<LexiconStats> {
        self.context.stats()
    }

    /// 单词状态机：归一化 → 查词典 → G2P → 相似词
    fn word_verdict(&self, model: &ActiveModel, word: &str) -> WordVerdict {
        let model_id = Some(model.info.id.clone());

        // 1. 归一化
        let normalized = normalize_word(word);
        if normalized.is_empty() {
            return WordVerdict::error(word, "invalid input: word is empty after normalization", model_id);
        }

        // 2. 词典命中
        if let Some(pronunciations) = model.lexicon.lookup(&normalized) {
            return WordVerdict {
                word: normalized,
                status: WordStatus::Known,
                confidence: 1.0,
                tier: ConfidenceTier::Excellent,
                pronunciations: pronunciations.to_vec(),
                guessed_pronunciation: None,
                guess_confidence: None,
                similar_words: Vec::new(),
                notes: vec![format!("found in {}", model.lexicon.kind().display_name())],
                recommendation: "Recognized by the model lexicon".to_string(),
                model_id,
            };
        }

        // 3. G2P 预测
        let prediction = match model.predictor.predict(&normalized) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("G2P 预测失败 {}: {}", normalized, e);
                return WordVerdict::error(&normalized, e.to_string(), model_id);
            }
        };

        // 4. 相似词（未命中时总是计算）
        let similar_words =
            self.suggester
                .suggest(&normalized, model.lexicon.words(), self.config.max_suggestions);

        let mut notes = vec![format!(
            "not in {}",
            model.lexicon.kind().display_name()
        )];
        if prediction.has_non_alphabetic {
            notes.push("contains digits or symbols".to_string());
        }
        if let Some(p) = &prediction.pronunciation {
            notes.push(format!(
                "{} ({}) estimate: {} (confidence {:.2})",
                model.predictor.name(),
                model.predictor.language(),
                p,
                prediction.confidence
            ));
        }
        if !similar_words.is_empty() {
            notes.push(format!("{} similar words found", similar_words.len()));
        }

        let usable = prediction.pronunciation.is_some()
            && prediction.confidence >= self.config.usable_guess_threshold;

        // 5. 汇总状态
        let (status, confidence, guessed_pronunciation) = if usable {
            (
                WordStatus::Guessed,
                prediction.confidence,
                prediction.pronunciation.clone(),
            )
        } else {
            let confidence = similar_words
                .first()
                .map(|s| (s.score * self.config.similarity_boost).clamp(0.0, 1.0))
                .unwrap_or(0.0);
            (WordStatus::Unknown, confidence, None)
        };

        let recommendation = Self::word_recommendation(status, confidence, &similar_words);
        WordVerdict {
            word: normalized,
            status,
            confidence,
            tier: ConfidenceTier::from_score(confidence),
            pronunciations: Vec::new(),
            guessed_pronunciation,
            guess_confidence: Some(prediction.confidence),
            similar_words,
            notes,
            recommendation,
            model_id,
        }
    }

    fn word_recommendation(status: WordStatus, confidence: f64, similar: &[Suggestion]) -> String {
        match status {
            WordStatus::Known => "Recognized by the model lexicon".to_string(),
            WordStatus::Guessed if confidence > 0.7 => {
                "Estimated pronunciation with high confidence".to_string()
            }
            WordStatus::Guessed => "Estimated pronunciation - test voice accuracy".to_string(),
            WordStatus::Unknown | WordStatus::Error => match similar.first() {
                Some(best) => format!(
                    "Consider '{}' (similarity {:.0}%)",
                    best.word,
                    best.score * 100.0
                ),
                None => "Hard to recognize - renaming recommended".to_string(),
            },
        }
    }

    fn entity_verdict(&self, model: &ActiveModel, entity_name: &str) -> EntityVerdict {
        let words = split_entity_name(entity_name);
        let words_results: Vec<WordVerdict> =
            words.iter().map(|w| self.word_verdict(model, w)).collect();

        let overall_status = entity::aggregate_status(&words_results);
        let recognized_ratio = entity::recognized_ratio(&words_results);
        let overall_score = entity::overall_score(&words_results);
        let recommendations = entity::recommendations(
            entity_name,
            &words_results,
            recognized_ratio,
            overall_score,
            self.config.rename_ratio_threshold,
            model.lexicon.kind(),
        );
        let alternatives = entity::alternatives(&words, &words_results);

        EntityVerdict {
            entity_id: entity_name.to_string(),
            words,
            overall_status,
            recognized_ratio,
            overall_score,
            overall_tier: ConfidenceTier::from_score(overall_score),
            words_results,
            recommendations,
            alternatives,
        }
    }

    fn entity_without_model(entity_name: &str) -> EntityVerdict {
        let words = split_entity_name(entity_name);
        let words_results = words
            .iter()
            .map(|w| WordVerdict::error(w, NO_MODEL_NOTE, None))
            .collect();
        EntityVerdict {
            entity_id: entity_name.to_string(),
            words,
            overall_status: WordStatus::Error,
            recognized_ratio: 0.0,
            overall_score: 0.0,
            overall_tier: ConfidenceTier::Unknown,
            words_results,
            recommendations: vec!["No model selected".to_string()],
            alternatives: Vec::new(),
        }
    }

    fn batch_verdict(&self, model_id: Option<String>, entity_results: Vec<EntityVerdict>) -> BatchVerdict {
        let total_entities = entity_results.len();
        let mut known_entities = 0;
        let mut partially_known_entities = 0;
        let mut unknown_entities = 0;
        for result in &entity_results {
            match result.overall_status {
                WordStatus::Known => known_entities += 1,
                WordStatus::Guessed => partially_known_entities += 1,
                WordStatus::Unknown | WordStatus::Error => unknown_entities += 1,
            }
        }

        let overall_score = if total_entities > 0 {
            entity_results.iter().map(|e| e.recognized_ratio).sum::<f64>() / total_entities as f64
        } else {
            0.0
        };

        let mut recommendations = Vec::new();
        if model_id.is_none() {
            recommendations.push("No model selected".to_string());
        } else if total_entities > 0 {
            if unknown_entities > 0 {
                recommendations.push(format!(
                    "{} entities contain unrecognized words",
                    unknown_entities
                ));
            }
            if partially_known_entities > 0 {
                recommendations.push(format!(
                    "{} entities rely on estimated pronunciations",
                    partially_known_entities
                ));
            }
            if overall_score < self.config.batch_rename_score_threshold {
                recommendations.push("Consider renaming entities with more common words".to_string());
            }
        }

        tracing::debug!(
            "批量校验完成: {} 个实体, known={}, partial={}, unknown={}, score={:.2}",
            total_entities,
            known_entities,
            partially_known_entities,
            unknown_entities,
            overall_score
        );

        BatchVerdict {
            model_id,
            total_entities,
            known_entities,
            partially_known_entities,
            unknown_entities,
            overall_score,
            entity_results,
            recommendations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContextSettings, ModelInfo, StaticModelProvider};
    use std::path::Path;

    const LEXICON: &str = "\
luce l u tS e
cucina k u tS i n a
soggiorno s o dZ dZ o r n o
camera k a m e r a
sala s a l a
";

    fn validator(dir: &Path, lexicon: &str) -> Validator {
        let path = dir.join("lexicon.txt");
        std::fs::write(&path, lexicon).unwrap();
        let ctx = ModelContext::new(
            StaticModelProvider::new(vec![ModelInfo::new("it_IT-test", path)]),
            ContextSettings::default(),
        );
        ctx.select("it_IT-test").unwrap();
        Validator::new(Arc::new(ctx), ValidationConfig::default())
    }

    #[test]
    fn test_known_word() {
        let dir = tempfile::tempdir().unwrap();
        let v = validator(dir.path(), LEXICON);
        let verdict = v.validate_word(" Luce ");
        assert_eq!(verdict.word, "luce");
        assert_eq!(verdict.status, WordStatus::Known);
        assert_eq!(verdict.confidence, 1.0);
        assert_eq!(verdict.tier, ConfidenceTier::Excellent);
        assert_eq!(verdict.pronunciations[0].to_string(), "l u tS e");
        assert!(verdict.similar_words.is_empty());
        assert_eq!(verdict.model_id.as_deref(), Some("it_IT-test"));
    }

    #[test]
    fn test_guessed_word() {
        let dir = tempfile::tempdir().unwrap();
        let v = validator(dir.path(), LEXICON);
        let verdict = v.validate_word("tapparella");
        assert_eq!(verdict.status, WordStatus::Guessed);
        assert!((verdict.confidence - 0.9).abs() < 1e-9);
        assert_eq!(verdict.guess_confidence, Some(verdict.confidence));
        assert_eq!(
            verdict.guessed_pronunciation.as_ref().unwrap().to_string(),
            "t a p p a r e l l a"
        );
        assert!(verdict.pronunciations.is_empty());
    }

    #[test]
    fn test_guessed_word_still_gets_similar_words() {
        let dir = tempfile::tempdir().unwrap();
        let v = validator(dir.path(), LEXICON);
        let verdict = v.validate_word("cucine");
        assert_eq!(verdict.status, WordStatus::Guessed);
        assert!(verdict.guessed_pronunciation.is_some());
        assert!(!verdict.similar_words.is_empty());
        assert_eq!(verdict.similar_words[0].word, "cucina");
        assert!((verdict.similar_words[0].score - 5.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_word_with_and_without_suggestions() {
        let dir = tempfile::tempdir().unwrap();
        let v = validator(dir.path(), LEXICON);

        let alexa = v.validate_word("alexa");
        assert_eq!(alexa.status, WordStatus::Unknown);
        assert_eq!(alexa.confidence, 0.0);
        assert!(alexa.similar_words.is_empty());
        assert!(alexa.guessed_pronunciation.is_none());
        assert!(alexa.guess_confidence.unwrap() < 0.5);

        // 含数字：G2P 置信度封顶，但有相似词
        let luce2 = v.validate_word("luce2");
        assert_eq!(luce2.status, WordStatus::Unknown);
        let top = luce2.similar_words[0].clone();
        assert_eq!(top.word, "luce");
        assert!((luce2.confidence - top.score * 0.3).abs() < 1e-9);
        assert!(luce2.confidence < 0.5);
        assert!(luce2.recommendation.contains("'luce'"));
    }

    #[test]
    fn test_empty_word_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let v = validator(dir.path(), LEXICON);
        let verdict = v.validate_word("  !! ");
        assert_eq!(verdict.status, WordStatus::Error);
        assert_eq!(verdict.confidence, 0.0);
        assert!(verdict.notes[0].contains("invalid input"));
    }

    #[test]
    fn test_entity() {
        let dir = tempfile::tempdir().unwrap();
        let v = validator(dir.path(), LEXICON);

        let known = v.validate_entity("luce_cucina");
        assert_eq!(known.words, vec!["luce", "cucina"]);
        assert_eq!(known.overall_status, WordStatus::Known);
        assert_eq!(known.recognized_ratio, 1.0);
        assert_eq!(known.overall_score, 1.0);
        assert_eq!(known.overall_tier, ConfidenceTier::Excellent);
        assert_eq!(
            known.recommendations,
            vec!["Excellent entity name for Speech-to-Phrase"]
        );

        let unknown = v.validate_entity("alexa_echo");
        assert_eq!(unknown.overall_status, WordStatus::Unknown);
        assert_eq!(unknown.recognized_ratio, 0.0);
        assert!(unknown
            .recommendations
            .iter()
            .any(|r| r.starts_with("Consider renaming the entity")));

        assert_eq!(unknown.overall_tier, ConfidenceTier::Unknown);

        let mixed = v.validate_entity("condizionatore soggiorno");
        assert_eq!(mixed.overall_status, WordStatus::Guessed);
        assert_eq!(mixed.recognized_ratio, 0.5);
        let expected = (mixed.words_results[0].confidence + 1.0) / 2.0;
        assert!((mixed.overall_score - expected).abs() < 1e-9);
        assert_eq!(mixed.overall_tier, ConfidenceTier::from_score(expected));

        let empty = v.validate_entity("__--");
        assert_eq!(empty.overall_status, WordStatus::Error);
        assert!(empty.words_results.is_empty());
    }

    #[test]
    fn test_entity_alternatives() {
        let dir = tempfile::tempdir().unwrap();
        let v = validator(dir.path(), LEXICON);
        let verdict = v.validate_entity("luce_cucinx");
        assert_eq!(verdict.words_results[1].status, WordStatus::Unknown);
        assert_eq!(verdict.alternatives, vec!["luce_cucina"]);
    }

    #[test]
    fn test_batch() {
        let dir = tempfile::tempdir().unwrap();
        let v = validator(dir.path(), LEXICON);
        let batch = v.validate_entities(&["luce_cucina", "alexa_echo"]);
        assert_eq!(batch.model_id.as_deref(), Some("it_IT-test"));
        assert_eq!(batch.total_entities, 2);
        assert_eq!(batch.known_entities, 1);
        assert_eq!(batch.unknown_entities, 1);
        assert_eq!(batch.partially_known_entities, 0);
        assert!((batch.overall_score - 0.5).abs() < 1e-9);
        assert_eq!(batch.entity_results[0].entity_id, "luce_cucina");
        assert_eq!(batch.entity_results[1].entity_id, "alexa_echo");
        assert!(batch
            .recommendations
            .iter()
            .any(|r| r == "1 entities contain unrecognized words"));

        let empty = v.validate_entities::<&str>(&[]);
        assert_eq!(empty.overall_score, 0.0);
        assert!(empty.recommendations.is_empty());
    }

    #[test]
    fn test_batch_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let v = validator(dir.path(), LEXICON);
        let entities: Vec<String> = (0..64)
            .map(|i| if i % 2 == 0 { format!("luce_{}", i) } else { "sala".to_string() })
            .collect();
        let batch = v.validate_entities(&entities);
        let ids: Vec<&str> = batch.entity_results.iter().map(|e| e.entity_id.as_str()).collect();
        let expected: Vec<&str> = entities.iter().map(String::as_str).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_constrained_lexicon_recommendation() {
        let dir = tempfile::tempdir().unwrap();
        let v = validator(dir.path(), LEXICON);
        let verdict = v.validate_entity("luce_tapparella");
        assert!(verdict
            .recommendations
            .iter()
            .any(|r| r.contains("training templates")));
    }

    #[test]
    fn test_no_model_selected() {
        let ctx = ModelContext::new(StaticModelProvider::default(), ContextSettings::default());
        let v = Validator::new(Arc::new(ctx), ValidationConfig::default());

        let word = v.validate_word("luce");
        assert_eq!(word.status, WordStatus::Error);
        assert_eq!(word.notes, vec!["no model selected"]);

        let entity = v.validate_entity("luce_cucina");
        assert_eq!(entity.overall_status, WordStatus::Error);
        assert_eq!(entity.words_results.len(), 2);

        let batch = v.validate_entities(&["luce_cucina"]);
        assert!(batch.model_id.is_none());
        assert_eq!(batch.recommendations, vec!["No model selected"]);

        assert!(matches!(v.stats(), Err(ValidatorError::NoModelSelected)));
        assert!(matches!(
            v.suggest_alternatives("luce", 5),
            Err(ValidatorError::NoModelSelected)
        ));
    }

    #[test]
    fn test_suggest_alternatives() {
        let dir = tempfile::tempdir().unwrap();
        let v = validator(dir.path(), LEXICON);
        let suggestions = v.suggest_alternatives("cucinx", 3).unwrap();
        assert_eq!(suggestions[0].word, "cucina");
        assert!(matches!(
            v.suggest_alternatives(" ", 3),
            Err(ValidatorError::InvalidWord { .. })
        ));
    }
}
