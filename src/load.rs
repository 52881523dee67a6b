use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use jsonschema::JSONSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::model::{Class, ClassOrigin, Program};

const PROGRAM_SCHEMA: &str = include_str!("../schema/program.schema.json");

/// Program model assembled from the input and classpath entries.
pub struct LoadOutput {
    pub program: Program,
    pub file_count: usize,
}

#[derive(Deserialize)]
struct ProgramDocument {
    classes: Vec<Class>,
}

/// JSON Schema validator for program model documents.
pub struct ModelValidator {
    schema: JSONSchema,
}

impl ModelValidator {
    pub fn new() -> Result<Self> {
        let schema: Value =
            serde_json::from_str(PROGRAM_SCHEMA).context("failed to parse program schema")?;
        let schema = JSONSchema::compile(&schema)
            .map_err(|err| anyhow::anyhow!("failed to compile program schema: {err}"))?;
        Ok(Self { schema })
    }

    /// Validate and deserialize one program model document.
    pub fn parse(&self, text: &str) -> Result<Vec<Class>> {
        let value: Value = serde_json::from_str(text).context("malformed JSON")?;
        if let Err(errors) = self.schema.validate(&value) {
            let messages: Vec<String> = errors.map(|err| err.to_string()).collect();
            anyhow::bail!("program model violates schema: {}", messages.join("; "));
        }
        let document: ProgramDocument =
            serde_json::from_value(value).context("failed to decode program model")?;
        for class in &document.classes {
            for method in &class.methods {
                method
                    .sub
                    .method_descriptor()
                    .with_context(|| format!("invalid method {}.{}", class.name, method.sub))?;
            }
        }
        Ok(document.classes)
    }
}

pub fn load_inputs(input: &Path, classpath: &[PathBuf]) -> Result<LoadOutput> {
    let validator = ModelValidator::new()?;
    let mut output = LoadOutput {
        program: Program::new(),
        file_count: 0,
    };

    load_path(&validator, input, ClassOrigin::Application, true, &mut output)?;

    // Keep deterministic ordering by sorting classpath entries and directory listings.
    let mut classpath_entries = classpath.to_vec();
    classpath_entries.sort_by(|a, b| path_key(a).cmp(&path_key(b)));

    for entry in classpath_entries {
        load_path(&validator, &entry, ClassOrigin::Library, true, &mut output)?;
    }

    Ok(output)
}

fn load_path(
    validator: &ModelValidator,
    path: &Path,
    origin: ClassOrigin,
    strict: bool,
    output: &mut LoadOutput,
) -> Result<()> {
    if path.is_dir() {
        return load_dir(validator, path, origin, output);
    }

    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
    match extension {
        "json" => load_model_file(validator, path, origin, output),
        _ => {
            if strict {
                anyhow::bail!("unsupported input file: {}", path.display())
            } else {
                Ok(())
            }
        }
    }
}

fn load_dir(
    validator: &ModelValidator,
    path: &Path,
    origin: ClassOrigin,
    output: &mut LoadOutput,
) -> Result<()> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(path)
        .with_context(|| format!("failed to read directory {}", path.display()))?
    {
        let entry =
            entry.with_context(|| format!("failed to read entry under {}", path.display()))?;
        entries.push(entry.path());
    }

    entries.sort_by(|a, b| path_key(a).cmp(&path_key(b)));

    for entry in entries {
        load_path(validator, &entry, origin, false, output)?;
    }

    Ok(())
}

fn load_model_file(
    validator: &ModelValidator,
    path: &Path,
    origin: ClassOrigin,
    output: &mut LoadOutput,
) -> Result<()> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let classes = validator
        .parse(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    tracing::debug!(
        target: "chagraph",
        path = %path.display(),
        classes = classes.len(),
        "loaded program model"
    );
    output.program.add_classes(classes, origin);
    output.file_count += 1;
    Ok(())
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ClassId, Statement};
    use crate::model::ProgramModel;
    use crate::model::tests::sig;

    const APP: &str = r#"{
        "classes": [
            {
                "name": "com/example/App",
                "superclass": "java/lang/Object",
                "methods": [
                    {
                        "name": "main",
                        "descriptor": "([Ljava/lang/String;)V",
                        "static": true,
                        "body": [
                            {
                                "op": "invoke",
                                "target": "com/example/Shape.area()D",
                                "kind": "virtual"
                            },
                            {
                                "op": "assign",
                                "local": "x",
                                "value": {
                                    "op": "invoke",
                                    "target": "com/example/Shape.name()Ljava/lang/String;"
                                }
                            },
                            {"op": "other"}
                        ]
                    }
                ]
            },
            {
                "name": "com/example/Shape",
                "interface": true,
                "methods": [{"name": "area", "descriptor": "()D", "body": null}]
            }
        ]
    }"#;

    const LIB: &str = r#"{
        "classes": [
            {
                "name": "java/lang/Object",
                "superclass": null,
                "methods": [{"name": "<init>", "descriptor": "()V", "body": []}]
            }
        ]
    }"#;

    #[test]
    fn parse_accepts_valid_document() {
        let validator = ModelValidator::new().expect("validator");
        let classes = validator.parse(APP).expect("parse model");

        assert_eq!(classes.len(), 2);
        assert_eq!(classes[0].name, ClassId::new("com/example/App"));
        let main = &classes[0].methods[0];
        assert!(main.is_static);
        let body = main.body.as_ref().expect("body");
        assert_eq!(body.len(), 3);
        assert_eq!(body[2], Statement::Other);
        assert!(classes[1].is_interface);
        assert!(classes[1].methods[0].body.is_none());
    }

    #[test]
    fn parse_rejects_schema_violations() {
        let validator = ModelValidator::new().expect("validator");

        for text in [
            r#"{}"#,
            r#"{"classes": [{"methods": []}]}"#,
            r#"{"classes": [{"name": "A", "methods": [{"name": "run", "descriptor": "V"}]}]}"#,
            r#"{"classes": [{"name": "A", "methods": [
                {"name": "run", "descriptor": "()V", "body": [{"op": "jump"}]}
            ]}]}"#,
            r#"{"classes": [{"name": "A", "methods": [
                {"name": "run", "descriptor": "()V",
                 "body": [{"op": "invoke", "target": "nowhere"}]}
            ]}]}"#,
        ] {
            assert!(validator.parse(text).is_err(), "{text}");
        }
        assert!(validator.parse("not json").is_err());
    }

    #[test]
    fn parse_rejects_undecodable_method_descriptors() {
        let validator = ModelValidator::new().expect("validator");

        for descriptor in ["(Q)V", "(V)V", "()VV"] {
            let text = format!(
                r#"{{"classes": [{{"name": "A", "methods": [
                    {{"name": "run", "descriptor": "{descriptor}", "body": []}}
                ]}}]}}"#
            );
            let err = validator.parse(&text).expect_err(descriptor);
            assert!(format!("{err:#}").contains("invalid method A.run"), "{err:#}");
        }
    }

    #[test]
    fn load_inputs_merges_input_and_classpath() {
        let dir = tempfile::tempdir().expect("temp dir");
        let input = dir.path().join("app");
        fs::create_dir_all(&input).expect("create input dir");
        fs::write(input.join("app.json"), APP).expect("write app model");
        fs::write(input.join("README.txt"), "ignored").expect("write text file");
        let lib = dir.path().join("lib.json");
        fs::write(&lib, LIB).expect("write lib model");

        let output = load_inputs(&input, &[lib]).expect("load inputs");

        assert_eq!(output.file_count, 2);
        assert_eq!(output.program.class_count(), 3);
        let application: Vec<&ClassId> = output
            .program
            .application_classes()
            .map(|class| &class.name)
            .collect();
        assert_eq!(
            application,
            vec![&ClassId::new("com/example/App"), &ClassId::new("com/example/Shape")]
        );
        assert!(output.program.method_exists(&sig("java/lang/Object.<init>()V")));
    }

    #[test]
    fn load_inputs_rejects_unsupported_and_invalid_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        let text = dir.path().join("model.txt");
        fs::write(&text, APP).expect("write model");
        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{\"classes\": 3}").expect("write model");

        assert!(load_inputs(&text, &[]).is_err());
        assert!(load_inputs(&broken, &[]).is_err());
        assert!(load_inputs(&dir.path().join("missing.json"), &[]).is_err());
    }
}
