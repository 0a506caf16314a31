// Model - boosted-tree evaluation from the XGBoost JSON model format
//
// Only inference is supported. The booster is loaded once, validated, and
// evaluated by walking each tree from the root:
// - node i is a leaf when left_children[i] == -1; its value is split_conditions[i]
// - go left when x[split_indices[i]] < split_conditions[i], or when the value
//   is missing (NaN) and default_left[i] is set
// - both sides of the comparison are rounded to f32 first, as XGBoost does
//
// margin = Σ leaf values + base margin, probability = sigmoid(margin) for the
// logistic objectives.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::AnalysisError;

/// Loss the booster was trained with, which fixes how the margin maps to an
/// output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Objective {
    /// `binary:logistic` / `reg:logistic`: base_score is a probability
    Logistic,
    /// `binary:logitraw`: base_score is already a margin
    LogitRaw,
    /// Anything else: raw margin, clamped to [0, 1]
    Other(String),
}

impl Objective {
    fn from_name(name: &str) -> Self {
        match name {
            "binary:logistic" | "reg:logistic" => Objective::Logistic,
            "binary:logitraw" => Objective::LogitRaw,
            other => Objective::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ModelFile {
    learner: LearnerJson,
}

#[derive(Debug, Deserialize)]
struct LearnerJson {
    gradient_booster: BoosterJson,
    learner_model_param: LearnerParamJson,
    objective: ObjectiveJson,
}

#[derive(Debug, Deserialize)]
struct BoosterJson {
    #[serde(default)]
    name: Option<String>,
    model: GbtreeJson,
}

#[derive(Debug, Deserialize)]
struct GbtreeJson {
    trees: Vec<TreeJson>,
}

#[derive(Debug, Deserialize)]
struct LearnerParamJson {
    base_score: String,
    #[serde(default)]
    num_feature: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectiveJson {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TreeJson {
    left_children: Vec<i32>,
    right_children: Vec<i32>,
    split_indices: Vec<u32>,
    split_conditions: Vec<f64>,
    default_left: Vec<Flag>,
}

/// `default_left` is written as 0/1 by older releases and as bools by some
/// converters
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
}

impl Flag {
    fn is_set(self) -> bool {
        match self {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        }
    }
}

/// One regression tree in flat array form
#[derive(Debug, Clone, PartialEq)]
struct Tree {
    left: Vec<i32>,
    right: Vec<i32>,
    split_index: Vec<u32>,
    split_condition: Vec<f64>,
    default_left: Vec<bool>,
}

impl Tree {
    fn from_json(json: TreeJson, tree_idx: usize) -> Result<Self, AnalysisError> {
        let n = json.left_children.len();
        if n == 0 {
            return Err(model_error(format!("tree {} has no nodes", tree_idx)));
        }
        if json.right_children.len() != n
            || json.split_indices.len() != n
            || json.split_conditions.len() != n
            || json.default_left.len() != n
        {
            return Err(model_error(format!(
                "tree {} has node arrays of different lengths",
                tree_idx
            )));
        }

        for (i, (&left, &right)) in json.left_children.iter().zip(&json.right_children).enumerate() {
            if left == -1 {
                continue;
            }
            // Children always follow their parent, which also rules out cycles
            let valid = |child: i32| child > i as i32 && (child as usize) < n;
            if !valid(left) || !valid(right) {
                return Err(model_error(format!(
                    "tree {} node {} has invalid children ({}, {})",
                    tree_idx, i, left, right
                )));
            }
        }

        Ok(Self {
            left: json.left_children,
            right: json.right_children,
            split_index: json.split_indices,
            split_condition: json.split_conditions,
            default_left: json.default_left.into_iter().map(Flag::is_set).collect(),
        })
    }

    fn max_feature_index(&self) -> Option<usize> {
        self.left
            .iter()
            .zip(&self.split_index)
            .filter(|(&left, _)| left != -1)
            .map(|(_, &idx)| idx as usize)
            .max()
    }

    fn leaf_value(&self, features: &[f64]) -> f64 {
        let mut node = 0usize;
        while self.left[node] != -1 {
            let value = features
                .get(self.split_index[node] as usize)
                .copied()
                .unwrap_or(f64::NAN);
            let go_left = if value.is_nan() {
                self.default_left[node]
            } else {
                (value as f32) < (self.split_condition[node] as f32)
            };
            node = if go_left {
                self.left[node] as usize
            } else {
                self.right[node] as usize
            };
        }
        self.split_condition[node]
    }
}

/// Pretrained gradient-boosted trees for binary classification
#[derive(Debug, Clone, PartialEq)]
pub struct BoostedTrees {
    trees: Vec<Tree>,
    base_score: f64,
    objective: Objective,
    num_features: Option<usize>,
}

impl BoostedTrees {
    /// Load a model saved with `Booster.save_model("*.json")`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| model_error(format!("failed to read {}: {}", path.display(), e)))?;
        let model = Self::from_json(&contents)?;
        log::info!(
            "[Model] Loaded {} trees ({:?}) from {:?}",
            model.num_trees(),
            model.objective,
            path
        );
        Ok(model)
    }

    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let file: ModelFile = serde_json::from_str(json).map_err(|e| model_error(e.to_string()))?;
        let learner = file.learner;

        if let Some(name) = learner.gradient_booster.name.as_deref() {
            if name != "gbtree" {
                return Err(model_error(format!("unsupported booster '{}'", name)));
            }
        }

        let base_score = parse_float(&learner.learner_model_param.base_score)
            .ok_or_else(|| model_error(format!(
                "invalid base_score '{}'",
                learner.learner_model_param.base_score
            )))?;

        let num_features = match learner.learner_model_param.num_feature.as_deref() {
            Some(raw) => match parse_float(raw) {
                Some(n) if n >= 1.0 => Some(n as usize),
                Some(_) => None,
                None => return Err(model_error(format!("invalid num_feature '{}'", raw))),
            },
            None => None,
        };

        let trees = learner
            .gradient_booster
            .model
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, tree)| Tree::from_json(tree, i))
            .collect::<Result<Vec<_>, _>>()?;

        if let (Some(expected), Some(max_idx)) =
            (num_features, trees.iter().filter_map(Tree::max_feature_index).max())
        {
            if max_idx >= expected {
                return Err(model_error(format!(
                    "split on feature {} but model declares {} features",
                    max_idx, expected
                )));
            }
        }

        let objective = Objective::from_name(&learner.objective.name);
        if objective == Objective::Logistic && !(base_score > 0.0 && base_score < 1.0) {
            return Err(model_error(format!(
                "base_score {} is not a probability",
                base_score
            )));
        }

        Ok(Self {
            trees,
            base_score,
            objective,
            num_features,
        })
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Feature count declared by the model, if any
    pub fn num_features(&self) -> Option<usize> {
        self.num_features
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    /// Raw additive score before the link function
    pub fn margin(&self, features: &[f64]) -> f64 {
        let base = match self.objective {
            Objective::Logistic => logit(self.base_score),
            Objective::LogitRaw | Objective::Other(_) => self.base_score,
        };
        base + self.trees.iter().map(|t| t.leaf_value(features)).sum::<f64>()
    }

    /// Positive-class probability in [0, 1]
    pub fn predict_proba(&self, features: &[f64]) -> Result<f64, AnalysisError> {
        if let Some(expected) = self.num_features {
            if features.len() != expected {
                return Err(AnalysisError::FeatureCountMismatch {
                    expected,
                    actual: features.len(),
                });
            }
        }

        let margin = self.margin(features);
        let probability = match self.objective {
            Objective::Logistic | Objective::LogitRaw => sigmoid(margin),
            Objective::Other(_) => margin.clamp(0.0, 1.0),
        };
        Ok(probability)
    }
}

fn model_error(reason: String) -> AnalysisError {
    AnalysisError::ModelFormat { reason }
}

/// Parse a float that may be wrapped in brackets (`"5E-1"`, `"[5E-1]"`)
fn parse_float(raw: &str) -> Option<f64> {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim()
        .parse()
        .ok()
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}
