//! Request assembly from an ambient snapshot.
//!
//! # Responsibilities
//! - Validate the method against the supported verb set
//! - Assemble and validate the URI
//! - Open the body stream from the raw input once
//! - Populate cookies, query, parsed body and the uploaded-file tree
//!
//! # Design Decisions
//! - Every value comes from the one snapshot passed in; nothing is re-read
//! - All objects are created through the injected factories

use std::sync::Arc;

use http::Method;
use serde_json::{Map, Value};
use url::Url;

use crate::ambient::{AmbientEnvironment, AmbientReader, FileDescriptor, FileValue};
use crate::config::RequestConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::http::factory::{RequestFactory, StreamFactory, UploadedFileFactory};
use crate::http::request::{Request, SUPPORTED_METHODS};
use crate::http::upload::{UploadError, UploadedFile, UploadedFiles};

/// Parse an uppercase method name, rejecting anything outside the supported set.
pub fn parse_method(name: &str) -> BridgeResult<Method> {
    SUPPORTED_METHODS
        .iter()
        .find(|m| m.as_str() == name)
        .cloned()
        .ok_or_else(|| BridgeError::InvalidRequest(format!("unsupported HTTP method \"{name}\"")))
}

/// Builds [`Request`] values from [`AmbientEnvironment`] snapshots.
#[derive(Clone)]
pub struct RequestBuilder {
    request_factory: Arc<dyn RequestFactory>,
    stream_factory: Arc<dyn StreamFactory>,
    uploaded_file_factory: Arc<dyn UploadedFileFactory>,
    config: RequestConfig,
}

impl RequestBuilder {
    pub fn new(
        request_factory: Arc<dyn RequestFactory>,
        stream_factory: Arc<dyn StreamFactory>,
        uploaded_file_factory: Arc<dyn UploadedFileFactory>,
        config: RequestConfig,
    ) -> Self {
        Self {
            request_factory,
            stream_factory,
            uploaded_file_factory,
            config,
        }
    }

    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    /// Build a request from `env`.
    pub fn build(&self, env: &AmbientEnvironment) -> BridgeResult<Request> {
        let reader = AmbientReader::new(env, &self.config);

        let method = parse_method(&reader.method())?;
        let uri_string = reader.uri_string();
        let uri = Url::parse(&uri_string).map_err(|e| {
            BridgeError::InvalidRequest(format!("malformed URI \"{uri_string}\": {e}"))
        })?;

        let mut request =
            self.request_factory
                .create_server_request(method, uri, env.server().clone());

        let headers = reader.headers();
        for (name, values) in headers.iter() {
            for value in values {
                request = request.with_added_header(name, value.clone());
            }
        }

        request = request
            .with_protocol_version(reader.protocol_version())
            .with_body(self.stream_factory.create_stream(env.raw_input().to_vec()));

        if !env.cookies().is_empty() {
            request = request.with_cookie_params(env.cookies().clone());
        }
        if !env.query().is_empty() {
            request = request.with_query_params(env.query().clone());
        }

        let content_type = headers.get_line("Content-Type");
        request = request.with_parsed_body(self.parsed_body(env, &content_type));

        if !env.files().is_empty() {
            request = request.with_uploaded_files(self.uploaded_files(env.files())?);
        }

        tracing::debug!(
            method = %request.method(),
            uri = %request.uri(),
            headers = request.headers().len(),
            files = env.files().len(),
            "Request built"
        );

        Ok(request)
    }

    fn parsed_body(&self, env: &AmbientEnvironment, content_type: &str) -> Option<Value> {
        if !env.form().is_empty() {
            let form: Map<String, Value> = env
                .form()
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            return Some(Value::Object(form));
        }

        if !self.config.parse_json_body
            || !content_type.to_ascii_lowercase().contains("application/json")
        {
            return None;
        }

        match serde_json::from_slice::<Value>(env.raw_input()) {
            Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
            Ok(_) => Some(Value::Object(Map::new())),
            Err(e) => {
                tracing::debug!(error = %e, "JSON body could not be decoded");
                Some(Value::Object(Map::new()))
            }
        }
    }

    fn uploaded_files(&self, files: &[(String, FileDescriptor)]) -> BridgeResult<UploadedFiles> {
        let mut fields = Vec::with_capacity(files.len());
        for (field, descriptor) in files {
            fields.push((field.clone(), self.normalize_descriptor(descriptor)?));
        }
        Ok(UploadedFiles::Branch(fields))
    }

    /// Multi-file descriptors hold parallel nested values; zip them key by
    /// key, recursing for nested field names.
    fn normalize_descriptor(&self, descriptor: &FileDescriptor) -> BridgeResult<UploadedFiles> {
        match &descriptor.name {
            FileValue::Scalar(name) => Ok(UploadedFiles::File(self.create_leaf(name, descriptor)?)),
            FileValue::Nested(names) => {
                let mut branch = Vec::with_capacity(names.len());
                for (key, name) in names {
                    let sub = FileDescriptor {
                        name: name.clone(),
                        media_type: pick(&descriptor.media_type, key),
                        tmp_name: pick(&descriptor.tmp_name, key),
                        error: pick(&descriptor.error, key),
                        size: pick(&descriptor.size, key),
                    };
                    branch.push((key.clone(), self.normalize_descriptor(&sub)?));
                }
                Ok(UploadedFiles::Branch(branch))
            }
        }
    }

    fn create_leaf(&self, name: &str, descriptor: &FileDescriptor) -> BridgeResult<UploadedFile> {
        let raw_error = scalar(&descriptor.error).trim();
        let error = raw_error
            .parse::<u8>()
            .ok()
            .and_then(UploadError::from_code)
            .ok_or_else(|| {
                BridgeError::InvalidRequest(format!(
                    "invalid upload status \"{raw_error}\" for file \"{name}\""
                ))
            })?;

        let size = scalar(&descriptor.size).trim().parse::<u64>().unwrap_or(0);

        let stream = if error == UploadError::Ok {
            let tmp_name = scalar(&descriptor.tmp_name);
            let stream = self
                .stream_factory
                .create_stream_from_file(std::path::Path::new(tmp_name))
                .map_err(|e| {
                    BridgeError::InvalidRequest(format!(
                        "cannot open uploaded file \"{tmp_name}\": {e}"
                    ))
                })?;
            Some(stream)
        } else {
            None
        };

        Ok(self.uploaded_file_factory.create_uploaded_file(
            stream,
            size,
            error,
            non_empty(name),
            non_empty(scalar(&descriptor.media_type)),
        ))
    }
}

fn pick(value: &FileValue, key: &str) -> FileValue {
    value
        .get(key)
        .cloned()
        .unwrap_or_else(|| FileValue::Scalar(String::new()))
}

fn scalar(value: &FileValue) -> &str {
    value.as_scalar().unwrap_or("")
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
