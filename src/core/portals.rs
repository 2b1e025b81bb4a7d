use crate::config::PortalsOptions;
use crate::domain::model::{Dataset, OutputFormat, PortalAggregate};
use crate::domain::ports::{Pipeline, Storage};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use serde_json::Value;

/// The two entry fields that reference portals, in aggregation order.
pub const REFERENCE_FIELDS: [&str; 2] = ["published_in", "connected_to"];

pub struct PortalsPipeline<S: Storage> {
    storage: S,
    options: PortalsOptions,
}

impl<S: Storage> PortalsPipeline<S> {
    pub fn new(storage: S, options: PortalsOptions) -> Self {
        Self { storage, options }
    }
}

#[async_trait]
impl<S: Storage> Pipeline for PortalsPipeline<S> {
    type Raw = Dataset;
    type Output = PortalAggregate;

    async fn extract(&self) -> Result<Dataset> {
        let bytes = self.storage.read_file(&self.options.input).await?;
        let document: Value = serde_json::from_slice(&bytes)?;
        let dataset = Dataset::from_document(&self.options.dataset_key(), &document)?;
        tracing::info!("loaded {} entries from {}", dataset.len(), self.options.input);
        Ok(dataset)
    }

    async fn transform(&self, dataset: Dataset) -> Result<PortalAggregate> {
        let mut aggregate = PortalAggregate::default();

        for entry in &dataset.entries {
            for field in REFERENCE_FIELDS {
                for reference in entry.references(field) {
                    if let Some(name) = reference.get("name").and_then(Value::as_str) {
                        tracing::debug!("{}: {}", field, name);
                    }
                    aggregate.record(reference);
                }
            }
        }

        tracing::info!("aggregated {} distinct portals", aggregate.len());
        Ok(aggregate)
    }

    async fn load(&self, aggregate: PortalAggregate) -> Result<String> {
        let document = if self.options.with_ids {
            aggregate.mapping()
        } else {
            aggregate.names()
        };

        let mut written = Vec::new();
        for format in &self.options.formats {
            match format {
                OutputFormat::Json => {
                    let data = serde_json::to_vec(&document)?;
                    self.storage.write_file("all_portals.json", &data).await?;
                    written.push("all_portals.json");
                }
                OutputFormat::Csv => {
                    let data = portals_csv(&aggregate)?;
                    self.storage.write_file("all_portals.csv", &data).await?;
                    written.push("all_portals.csv");
                }
            }
        }

        let first = written.first().ok_or_else(|| EtlError::ConfigError {
            message: "no output formats selected".to_string(),
        })?;

        println!("{}", aggregate.len());

        Ok(format!("{}/{}", self.options.output_path, first))
    }
}

fn portals_csv(aggregate: &PortalAggregate) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["name", "id"])?;
    for (name, id) in aggregate.iter() {
        let id = csv_id(id);
        writer.write_record([name.as_str(), id.as_str()])?;
    }
    writer.into_inner().map_err(|e| EtlError::ProcessingError {
        message: format!("CSV buffer error: {}", e),
    })
}

fn csv_id(id: &Value) -> String {
    match id {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Entry;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn put_file(&self, path: &str, data: &[u8]) {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    fn options(input: &str) -> PortalsOptions {
        PortalsOptions {
            input: input.to_string(),
            key: None,
            with_ids: false,
            formats: vec![OutputFormat::Json],
            output_path: "test_output".to_string(),
        }
    }

    fn entry(json: serde_json::Value) -> Entry {
        match json {
            Value::Object(fields) => Entry::new(fields),
            _ => panic!("test entry must be an object"),
        }
    }

    fn sample_dataset() -> Dataset {
        Dataset::new(
            "rc",
            vec![
                entry(serde_json::json!({
                    "title": "First exposition",
                    "published_in": [
                        {"name": "KC Research Portal", "id": 101},
                        {"name": "Journal of Sonic Studies", "id": 202}
                    ],
                    "connected_to": [
                        {"name": "KC Research Portal", "id": 101}
                    ]
                })),
                entry(serde_json::json!({
                    "title": "Second exposition",
                    "connected_to": [
                        {"name": "RUUKKU", "id": 303},
                        {"id": 404},
                        {"note": "no name, no id"}
                    ]
                })),
                entry(serde_json::json!({
                    "title": "No references at all"
                })),
            ],
        )
    }

    #[tokio::test]
    async fn test_transform_counts_distinct_names() {
        let pipeline = PortalsPipeline::new(MockStorage::new(), options("rc.json"));

        let aggregate = pipeline.transform(sample_dataset()).await.unwrap();

        // Three named portals; the nameless references do not count.
        assert_eq!(aggregate.len(), 3);
        assert_eq!(
            aggregate.names(),
            serde_json::json!(["Journal of Sonic Studies", "KC Research Portal", "RUUKKU"])
        );
    }

    #[tokio::test]
    async fn test_transform_last_id_wins() {
        let pipeline = PortalsPipeline::new(MockStorage::new(), options("rc.json"));

        let dataset = Dataset::new(
            "rc",
            vec![
                entry(serde_json::json!({
                    "published_in": [{"name": "Portal A", "id": 1}]
                })),
                entry(serde_json::json!({
                    "connected_to": [{"name": "Portal A", "id": 9}]
                })),
            ],
        );

        let aggregate = pipeline.transform(dataset).await.unwrap();
        assert_eq!(aggregate.len(), 1);
        assert_eq!(aggregate.mapping(), serde_json::json!({"Portal A": 9}));
    }

    #[tokio::test]
    async fn test_transform_bare_name_keeps_earlier_id() {
        let pipeline = PortalsPipeline::new(MockStorage::new(), options("rc.json"));

        let dataset = Dataset::new(
            "rc",
            vec![
                entry(serde_json::json!({
                    "published_in": [{"name": "Portal A", "id": 1}]
                })),
                entry(serde_json::json!({
                    "connected_to": [{"name": "Portal A"}]
                })),
            ],
        );

        let aggregate = pipeline.transform(dataset).await.unwrap();
        assert_eq!(aggregate.mapping(), serde_json::json!({"Portal A": 1}));
    }

    #[tokio::test]
    async fn test_extract_reads_dataset_by_file_stem() {
        let storage = MockStorage::new();
        let document = serde_json::json!({
            "rc": [{"title": "Entry"}]
        });
        storage
            .put_file("rc.json", &serde_json::to_vec(&document).unwrap())
            .await;

        let pipeline = PortalsPipeline::new(storage, options("rc.json"));
        let dataset = pipeline.extract().await.unwrap();

        assert_eq!(dataset.key, "rc");
        assert_eq!(dataset.len(), 1);
    }

    #[tokio::test]
    async fn test_extract_missing_key_names_available_keys() {
        let storage = MockStorage::new();
        let document = serde_json::json!({"kcpedia": []});
        storage
            .put_file("rc.json", &serde_json::to_vec(&document).unwrap())
            .await;

        let pipeline = PortalsPipeline::new(storage, options("rc.json"));
        let result = pipeline.extract().await;

        match result {
            Err(EtlError::ProcessingError { message }) => {
                assert!(message.contains("'rc'"));
                assert!(message.contains("kcpedia"));
            }
            other => panic!("expected ProcessingError, got {:?}", other.map(|d| d.key)),
        }
    }

    #[tokio::test]
    async fn test_load_writes_sorted_name_list() {
        let storage = MockStorage::new();
        let pipeline = PortalsPipeline::new(storage.clone(), options("rc.json"));

        let aggregate = pipeline.transform(sample_dataset()).await.unwrap();
        let output_path = pipeline.load(aggregate).await.unwrap();

        assert_eq!(output_path, "test_output/all_portals.json");

        let data = storage.get_file("all_portals.json").await.unwrap();
        let names: Vec<String> = serde_json::from_slice(&data).unwrap();
        assert_eq!(
            names,
            vec!["Journal of Sonic Studies", "KC Research Portal", "RUUKKU"]
        );
    }

    #[tokio::test]
    async fn test_load_mapping_variant() {
        let storage = MockStorage::new();
        let mut opts = options("rc.json");
        opts.with_ids = true;
        let pipeline = PortalsPipeline::new(storage.clone(), opts);

        let aggregate = pipeline.transform(sample_dataset()).await.unwrap();
        pipeline.load(aggregate).await.unwrap();

        let data = storage.get_file("all_portals.json").await.unwrap();
        let mapping: serde_json::Value = serde_json::from_slice(&data).unwrap();
        assert_eq!(
            mapping,
            serde_json::json!({
                "Journal of Sonic Studies": 202,
                "KC Research Portal": 101,
                "RUUKKU": 303
            })
        );
    }

    #[tokio::test]
    async fn test_load_csv_format() {
        let storage = MockStorage::new();
        let mut opts = options("rc.json");
        opts.formats = vec![OutputFormat::Json, OutputFormat::Csv];
        let pipeline = PortalsPipeline::new(storage.clone(), opts);

        let aggregate = pipeline.transform(sample_dataset()).await.unwrap();
        let output_path = pipeline.load(aggregate).await.unwrap();

        // JSON stays the primary output when both formats are requested.
        assert_eq!(output_path, "test_output/all_portals.json");

        let data = storage.get_file("all_portals.csv").await.unwrap();
        let content = String::from_utf8(data).unwrap();
        let lines: Vec<&str> = content.trim_end().split('\n').collect();
        assert_eq!(lines[0], "name,id");
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("Journal of Sonic Studies,"));
    }
}
