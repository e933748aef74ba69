use crate::error::{AppError, Result};
use crate::ml::encoders::FeatureEncoding;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use strum::Display;

/// Trait for pre-trained classifiers
pub trait Classifier: Send + Sync {
    /// Predict class indices, one per row
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<usize>> {
        let proba = self.predict_proba(features)?;
        Ok(proba.rows().into_iter().map(argmax).collect())
    }

    /// Predict class probabilities (n_samples × n_classes)
    fn predict_proba(&self, features: &Array2<f64>) -> Result<Array2<f64>>;

    /// Column order the model was trained on
    fn feature_names(&self) -> &[String];

    /// Number of output classes
    fn n_classes(&self) -> usize;

    /// Get model type
    fn model_type(&self) -> ModelType;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    LogisticRegression,
    DecisionTree,
    RandomForest,
}

/// Serialized model as exported next to the training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub version: Option<String>,

    /// Training column order
    pub feature_names_in: Vec<String>,

    pub n_classes: usize,

    /// Categorical coding the model was trained on
    pub encoding: FeatureEncoding,

    pub model: ModelParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "model_type", rename_all = "snake_case")]
pub enum ModelParams {
    LogisticRegression {
        /// One row per class (a single row for binary models)
        coefficients: Vec<Vec<f64>>,
        intercepts: Vec<f64>,
    },
    DecisionTree(TreeParams),
    RandomForest {
        trees: Vec<TreeParams>,
    },
}

/// Node arrays of a fitted tree. Leaves have `children_left == -1`;
/// `value[node]` is the class distribution at that node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeParams {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

impl ModelArtifact {
    /// Parse a model artifact from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| AppError::Artifact(format!("invalid model artifact: {}", e)))
    }

    /// Validate shapes and build the classifier
    pub fn into_classifier(self) -> Result<Box<dyn Classifier>> {
        let n_features = self.feature_names_in.len();
        if n_features == 0 {
            return Err(AppError::Artifact(
                "model declares no input features".to_string(),
            ));
        }
        if self.n_classes < 2 {
            return Err(AppError::Artifact(format!(
                "model declares {} classes, need at least 2",
                self.n_classes
            )));
        }

        let classifier: Box<dyn Classifier> = match self.model {
            ModelParams::LogisticRegression {
                coefficients,
                intercepts,
            } => Box::new(LogisticRegressionClassifier::new(
                self.feature_names_in,
                self.n_classes,
                coefficients,
                intercepts,
            )?),
            ModelParams::DecisionTree(tree) => Box::new(DecisionTreeClassifier::new(
                self.feature_names_in,
                self.n_classes,
                tree,
            )?),
            ModelParams::RandomForest { trees } => Box::new(RandomForestClassifier::new(
                self.feature_names_in,
                self.n_classes,
                trees,
            )?),
        };

        Ok(classifier)
    }
}

fn check_width(features: &Array2<f64>, expected: usize) -> Result<()> {
    if features.ncols() != expected {
        return Err(AppError::Contract(format!(
            "classifier expects {} features, got {}",
            expected,
            features.ncols()
        )));
    }
    Ok(())
}

fn argmax(row: ArrayView1<f64>) -> usize {
    row.iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (idx, &v)| {
            if v > best.1 {
                (idx, v)
            } else {
                best
            }
        })
        .0
}

fn softmax(scores: ArrayView1<f64>) -> Array1<f64> {
    let max = scores.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
    let exp = scores.mapv(|v| (v - max).exp());
    let sum = exp.sum();
    exp / sum
}

/// Multinomial (or binary) logistic regression
pub struct LogisticRegressionClassifier {
    feature_names: Vec<String>,
    n_classes: usize,
    /// n_score_rows × n_features
    coefficients: Array2<f64>,
    intercepts: Array1<f64>,
}

impl LogisticRegressionClassifier {
    pub fn new(
        feature_names: Vec<String>,
        n_classes: usize,
        coefficients: Vec<Vec<f64>>,
        intercepts: Vec<f64>,
    ) -> Result<Self> {
        let n_features = feature_names.len();
        let n_rows = coefficients.len();
        let expected_rows = if n_classes == 2 { 1..=2 } else { n_classes..=n_classes };

        if !expected_rows.contains(&n_rows) {
            return Err(AppError::Artifact(format!(
                "logistic regression has {} coefficient rows for {} classes",
                n_rows, n_classes
            )));
        }
        if intercepts.len() != n_rows {
            return Err(AppError::Artifact(format!(
                "logistic regression has {} intercepts for {} coefficient rows",
                intercepts.len(),
                n_rows
            )));
        }
        if let Some(row) = coefficients.iter().find(|row| row.len() != n_features) {
            return Err(AppError::Artifact(format!(
                "coefficient row has {} weights, model declares {} features",
                row.len(),
                n_features
            )));
        }

        let flat: Vec<f64> = coefficients.into_iter().flatten().collect();
        let coefficients = Array2::from_shape_vec((n_rows, n_features), flat)
            .map_err(|e| AppError::Artifact(format!("bad coefficient matrix: {}", e)))?;

        Ok(Self {
            feature_names,
            n_classes,
            coefficients,
            intercepts: Array1::from(intercepts),
        })
    }
}

impl Classifier for LogisticRegressionClassifier {
    fn predict_proba(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        check_width(features, self.feature_names.len())?;

        let scores = features.dot(&self.coefficients.t()) + &self.intercepts;
        let mut proba = Array2::zeros((features.nrows(), self.n_classes));

        for (i, row) in scores.rows().into_iter().enumerate() {
            // binary models carry one score row: class 1 vs an implicit 0
            let row = if row.len() == 1 {
                Array1::from(vec![0.0, row[0]])
            } else {
                row.to_owned()
            };
            proba.row_mut(i).assign(&softmax(row.view()));
        }

        Ok(proba)
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn model_type(&self) -> ModelType {
        ModelType::LogisticRegression
    }
}

const TREE_LEAF: i64 = -1;

/// A validated fitted tree
#[derive(Debug, Clone)]
struct Tree {
    params: TreeParams,
}

impl Tree {
    fn new(params: TreeParams, n_features: usize, n_classes: usize) -> Result<Self> {
        let n_nodes = params.children_left.len();
        let lengths = [
            params.children_right.len(),
            params.feature.len(),
            params.threshold.len(),
            params.value.len(),
        ];

        if n_nodes == 0 || lengths.iter().any(|&len| len != n_nodes) {
            return Err(AppError::Artifact(format!(
                "tree node arrays disagree in length ({} nodes)",
                n_nodes
            )));
        }

        for node in 0..n_nodes {
            let (left, right) = (params.children_left[node], params.children_right[node]);
            if params.value[node].len() != n_classes {
                return Err(AppError::Artifact(format!(
                    "tree node {} has {} class values, expected {}",
                    node,
                    params.value[node].len(),
                    n_classes
                )));
            }
            if left == TREE_LEAF {
                continue;
            }
            // children always come after their parent, so traversal terminates
            let child_ok = |child: i64| child > node as i64 && (child as usize) < n_nodes;
            if !child_ok(left) || !child_ok(right) {
                return Err(AppError::Artifact(format!(
                    "tree node {} has invalid children ({}, {})",
                    node, left, right
                )));
            }
            let feature = params.feature[node];
            if feature < 0 || feature as usize >= n_features {
                return Err(AppError::Artifact(format!(
                    "tree node {} splits on feature {} of {}",
                    node, feature, n_features
                )));
            }
        }

        Ok(Self { params })
    }

    /// Normalized class distribution of the leaf reached by `row`
    fn leaf_distribution(&self, row: ArrayView1<f64>) -> Array1<f64> {
        let p = &self.params;
        let mut node = 0usize;

        while p.children_left[node] != TREE_LEAF {
            let feature = p.feature[node] as usize;
            node = if row[feature] <= p.threshold[node] {
                p.children_left[node] as usize
            } else {
                p.children_right[node] as usize
            };
        }

        let counts = Array1::from(p.value[node].clone());
        let total = counts.sum();
        if total > 0.0 {
            counts / total
        } else {
            counts
        }
    }
}

/// Single decision tree
pub struct DecisionTreeClassifier {
    feature_names: Vec<String>,
    n_classes: usize,
    tree: Tree,
}

impl DecisionTreeClassifier {
    pub fn new(feature_names: Vec<String>, n_classes: usize, params: TreeParams) -> Result<Self> {
        let tree = Tree::new(params, feature_names.len(), n_classes)?;
        Ok(Self {
            feature_names,
            n_classes,
            tree,
        })
    }
}

impl Classifier for DecisionTreeClassifier {
    fn predict_proba(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        check_width(features, self.feature_names.len())?;

        let mut proba = Array2::zeros((features.nrows(), self.n_classes));
        for (i, row) in features.axis_iter(Axis(0)).enumerate() {
            proba.row_mut(i).assign(&self.tree.leaf_distribution(row));
        }
        Ok(proba)
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn model_type(&self) -> ModelType {
        ModelType::DecisionTree
    }
}

/// Forest of trees voting by averaged leaf distributions
pub struct RandomForestClassifier {
    feature_names: Vec<String>,
    n_classes: usize,
    trees: Vec<Tree>,
}

impl RandomForestClassifier {
    pub fn new(
        feature_names: Vec<String>,
        n_classes: usize,
        trees: Vec<TreeParams>,
    ) -> Result<Self> {
        if trees.is_empty() {
            return Err(AppError::Artifact("random forest has no trees".to_string()));
        }
        let n_features = feature_names.len();
        let trees = trees
            .into_iter()
            .map(|params| Tree::new(params, n_features, n_classes))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            feature_names,
            n_classes,
            trees,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for RandomForestClassifier {
    fn predict_proba(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        check_width(features, self.feature_names.len())?;

        let mut proba = Array2::zeros((features.nrows(), self.n_classes));
        for (i, row) in features.axis_iter(Axis(0)).enumerate() {
            let mut acc = Array1::<f64>::zeros(self.n_classes);
            for tree in &self.trees {
                acc += &tree.leaf_distribution(row);
            }
            proba.row_mut(i).assign(&(acc / self.trees.len() as f64));
        }
        Ok(proba)
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn model_type(&self) -> ModelType {
        ModelType::RandomForest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{}", i)).collect()
    }

    // splits on f0 <= 0.5: left leaf class 0, right leaf class 1
    fn stump() -> TreeParams {
        TreeParams {
            children_left: vec![1, -1, -1],
            children_right: vec![2, -1, -1],
            feature: vec![0, -2, -2],
            threshold: vec![0.5, -2.0, -2.0],
            value: vec![vec![5.0, 5.0], vec![5.0, 0.0], vec![0.0, 5.0]],
        }
    }

    #[test]
    fn test_logistic_regression_multiclass() {
        let clf = LogisticRegressionClassifier::new(
            names(2),
            3,
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![-1.0, -1.0]],
            vec![0.0, 0.0, 0.0],
        )
        .unwrap();

        let x = array![[5.0, 0.0], [0.0, 5.0], [-5.0, -5.0]];
        assert_eq!(clf.predict(&x).unwrap(), vec![0, 1, 2]);

        let proba = clf.predict_proba(&x).unwrap();
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_logistic_regression_binary_single_row() {
        let clf =
            LogisticRegressionClassifier::new(names(1), 2, vec![vec![2.0]], vec![-1.0]).unwrap();

        let x = array![[3.0], [-3.0]];
        assert_eq!(clf.predict(&x).unwrap(), vec![1, 0]);
    }

    #[test]
    fn test_logistic_regression_rejects_bad_shapes() {
        let err = LogisticRegressionClassifier::new(names(2), 3, vec![vec![1.0, 0.0]], vec![0.0]);
        assert!(err.is_err());

        let err = LogisticRegressionClassifier::new(
            names(2),
            2,
            vec![vec![1.0, 0.0, 3.0]],
            vec![0.0],
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_width_mismatch_is_contract_violation() {
        let clf = DecisionTreeClassifier::new(names(1), 2, stump()).unwrap();
        let err = clf.predict(&array![[0.0, 1.0]]).unwrap_err();
        assert!(matches!(err, AppError::Contract(_)));
    }

    #[test]
    fn test_decision_tree_traversal() {
        let clf = DecisionTreeClassifier::new(names(1), 2, stump()).unwrap();

        let x = array![[0.0], [0.5], [0.9]];
        assert_eq!(clf.predict(&x).unwrap(), vec![0, 0, 1]);
        assert_eq!(clf.predict_proba(&x).unwrap()[[2, 1]], 1.0);
    }

    #[test]
    fn test_tree_rejects_cycles() {
        let mut params = stump();
        params.children_left[0] = 0;
        assert!(DecisionTreeClassifier::new(names(1), 2, params).is_err());
    }

    #[test]
    fn test_tree_rejects_out_of_range_feature() {
        let mut params = stump();
        params.feature[0] = 3;
        assert!(DecisionTreeClassifier::new(names(1), 2, params).is_err());
    }

    #[test]
    fn test_random_forest_averages_trees() {
        let mut flipped = stump();
        flipped.value = vec![vec![5.0, 5.0], vec![1.0, 3.0], vec![0.0, 5.0]];

        let clf = RandomForestClassifier::new(names(1), 2, vec![stump(), flipped]).unwrap();
        assert_eq!(clf.n_trees(), 2);

        // left leaf: (1.0, 0.0) and (0.25, 0.75) -> (0.625, 0.375)
        let proba = clf.predict_proba(&array![[0.0]]).unwrap();
        assert!((proba[[0, 0]] - 0.625).abs() < 1e-9);
        assert_eq!(clf.predict(&array![[0.0]]).unwrap(), vec![0]);
    }

    #[test]
    fn test_artifact_json_round_trip_into_classifier() {
        let json = r#"{
            "name": "priority",
            "feature_names_in": ["f0"],
            "n_classes": 2,
            "encoding": "label_encoder",
            "model": {
                "model_type": "decision_tree",
                "children_left": [1, -1, -1],
                "children_right": [2, -1, -1],
                "feature": [0, -2, -2],
                "threshold": [0.5, -2.0, -2.0],
                "value": [[5, 5], [5, 0], [0, 5]]
            }
        }"#;

        let clf = ModelArtifact::from_json(json).unwrap().into_classifier().unwrap();
        assert_eq!(clf.model_type(), ModelType::DecisionTree);
        assert_eq!(clf.feature_names(), &["f0".to_string()]);
        assert_eq!(clf.predict(&array![[1.0]]).unwrap(), vec![1]);
    }
}
