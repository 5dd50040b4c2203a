//! OpenFeature provider backed by a [`FeatureManager`].
//!
//! Boolean flags resolve through the manager's enablement rule. Struct flags
//! resolve to the feature's options record. Other value types are not
//! expressible in a feature document and fail with `TypeMismatch`.

use crate::FeatureManager;
use crate::document::FlagState;
use crate::evaluator;
use async_trait::async_trait;
use open_feature::provider::{FeatureProvider, ProviderMetadata, ResolutionDetails};
use open_feature::{
    EvaluationContext, EvaluationError, EvaluationErrorCode, EvaluationReason, EvaluationResult,
    StructValue, Value,
};
use std::sync::Arc;
use tracing::{debug, instrument};

const METADATA: &str = "feature-manager";

#[derive(Debug)]
pub struct FeatureManagerProvider {
    metadata: ProviderMetadata,
    manager: Arc<FeatureManager>,
}

impl FeatureManagerProvider {
    pub fn new(manager: Arc<FeatureManager>) -> Self {
        Self {
            metadata: ProviderMetadata::new(METADATA),
            manager,
        }
    }

    pub fn manager(&self) -> &Arc<FeatureManager> {
        &self.manager
    }

    async fn flag_state(&self, flag_key: &str) -> EvaluationResult<FlagState> {
        let document = self.manager.feature_document(false).await?;
        evaluator::options(&document, flag_key)
            .cloned()
            .ok_or_else(|| EvaluationError {
                code: EvaluationErrorCode::FlagNotFound,
                message: Some(format!("Flag: {} not found", flag_key)),
            })
    }
}

#[async_trait]
impl FeatureProvider for FeatureManagerProvider {
    fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    #[instrument(skip(self, _evaluation_context), fields(flag_key = %flag_key))]
    async fn resolve_bool_value(
        &self,
        flag_key: &str,
        _evaluation_context: &EvaluationContext,
    ) -> EvaluationResult<ResolutionDetails<bool>> {
        let state = self.flag_state(flag_key).await?;
        let value = evaluator::resolve(&state);
        debug!(value, "Flag evaluated");

        Ok(ResolutionDetails {
            value,
            variant: None,
            reason: Some(if value {
                EvaluationReason::Static
            } else {
                EvaluationReason::Disabled
            }),
            flag_metadata: Default::default(),
        })
    }

    async fn resolve_int_value(
        &self,
        flag_key: &str,
        _evaluation_context: &EvaluationContext,
    ) -> EvaluationResult<ResolutionDetails<i64>> {
        self.flag_state(flag_key).await?;
        type_mismatch("integer")
    }

    async fn resolve_float_value(
        &self,
        flag_key: &str,
        _evaluation_context: &EvaluationContext,
    ) -> EvaluationResult<ResolutionDetails<f64>> {
        self.flag_state(flag_key).await?;
        type_mismatch("float")
    }

    async fn resolve_string_value(
        &self,
        flag_key: &str,
        _evaluation_context: &EvaluationContext,
    ) -> EvaluationResult<ResolutionDetails<String>> {
        self.flag_state(flag_key).await?;
        type_mismatch("string")
    }

    #[instrument(skip(self, _evaluation_context), fields(flag_key = %flag_key))]
    async fn resolve_struct_value(
        &self,
        flag_key: &str,
        _evaluation_context: &EvaluationContext,
    ) -> EvaluationResult<ResolutionDetails<StructValue>> {
        let options = match self.flag_state(flag_key).await? {
            FlagState::Options(options) => options,
            FlagState::Toggle(_) => return type_mismatch("struct"),
        };
        let record = serde_json::to_value(options).map_err(|e| EvaluationError {
            code: EvaluationErrorCode::ParseError,
            message: Some(e.to_string()),
        })?;
        let Value::Struct(value) = record.into_feature_value() else {
            return type_mismatch("struct");
        };

        Ok(ResolutionDetails {
            value,
            variant: None,
            reason: Some(EvaluationReason::Static),
            flag_metadata: Default::default(),
        })
    }
}

fn type_mismatch<T>(expected: &str) -> EvaluationResult<T> {
    Err(EvaluationError {
        code: EvaluationErrorCode::TypeMismatch,
        message: Some(format!(
            "Feature documents hold booleans and option records, not {} values",
            expected
        )),
    })
}

/// Converts JSON option values into OpenFeature values
trait IntoFeatureValue {
    fn into_feature_value(self) -> Value;
}

impl IntoFeatureValue for serde_json::Value {
    fn into_feature_value(self) -> Value {
        match self {
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or_default())
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(|v| v.into_feature_value()).collect())
            }
            serde_json::Value::Object(obj) => {
                let mut struct_value = StructValue::default();
                for (k, v) in obj {
                    struct_value.add_field(k, v.into_feature_value());
                }
                Value::Struct(struct_value)
            }
            serde_json::Value::Null => Value::String(String::new()),
        }
    }
}
