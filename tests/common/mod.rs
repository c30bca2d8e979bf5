// tests/common/mod.rs — Shared fixtures: a minimal ONNX model, image bytes,
// and a call-counting object store.
#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Mutex;

use leafmarket::storage::{MemoryObjectStore, ObjectStore, StorageError};

pub const ARTIFACT_PREFIX: &str = "ai-models/plant-disease-model";

// --- minimal protobuf writer -------------------------------------------------

fn varint(mut v: u64, out: &mut Vec<u8>) {
    loop {
        let byte = (v & 0x7f) as u8;
        v >>= 7;
        if v == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

fn field_varint(field: u64, value: u64, out: &mut Vec<u8>) {
    varint(field << 3, out);
    varint(value, out);
}

fn field_bytes(field: u64, data: &[u8], out: &mut Vec<u8>) {
    varint((field << 3) | 2, out);
    varint(data.len() as u64, out);
    out.extend_from_slice(data);
}

fn field_str(field: u64, s: &str, out: &mut Vec<u8>) {
    field_bytes(field, s.as_bytes(), out);
}

fn tensor_shape(dims: &[i64]) -> Vec<u8> {
    let mut shape = Vec::new();
    for &d in dims {
        let mut dim = Vec::new();
        field_varint(1, d as u64, &mut dim); // Dimension.dim_value
        field_bytes(1, &dim, &mut shape); // TensorShapeProto.dim
    }
    shape
}

fn float_tensor_type(dims: &[i64]) -> Vec<u8> {
    let mut tensor = Vec::new();
    field_varint(1, 1, &mut tensor); // elem_type = FLOAT
    field_bytes(2, &tensor_shape(dims), &mut tensor);
    let mut type_proto = Vec::new();
    field_bytes(1, &tensor, &mut type_proto); // TypeProto.tensor_type
    type_proto
}

fn value_info(name: &str, dims: &[i64]) -> Vec<u8> {
    let mut vi = Vec::new();
    field_str(1, name, &mut vi);
    field_bytes(2, &float_tensor_type(dims), &mut vi);
    vi
}

fn node(inputs: &[&str], outputs: &[&str], op_type: &str) -> Vec<u8> {
    let mut n = Vec::new();
    for input in inputs {
        field_str(1, input, &mut n);
    }
    for output in outputs {
        field_str(2, output, &mut n);
    }
    field_str(4, op_type, &mut n);
    n
}

fn float_initializer(name: &str, dims: &[i64], values: &[f32]) -> Vec<u8> {
    let mut tensor = Vec::new();
    for &d in dims {
        field_varint(1, d as u64, &mut tensor); // TensorProto.dims
    }
    field_varint(2, 1, &mut tensor); // data_type = FLOAT
    field_str(8, name, &mut tensor);
    let mut raw = Vec::with_capacity(values.len() * 4);
    for v in values {
        raw.extend_from_slice(&v.to_le_bytes());
    }
    field_bytes(9, &raw, &mut tensor); // raw_data
    tensor
}

/// Build a real ONNX model the crate can load: Flatten(image) → MatMul(w).
/// The weight matrix is zero except w[0][0] = 1, so score 0 equals the red
/// channel of the top-left pixel (1.0 for a solid red image) and score 1 is
/// always 0.
pub fn tiny_model_onnx() -> Vec<u8> {
    const FLAT: i64 = 224 * 224 * 3;

    let mut weights = vec![0f32; (FLAT * 2) as usize];
    weights[0] = 1.0;

    let mut graph = Vec::new();
    field_bytes(1, &node(&["image"], &["flat"], "Flatten"), &mut graph);
    field_bytes(1, &node(&["flat", "w"], &["scores"], "MatMul"), &mut graph);
    field_str(2, "maturity", &mut graph);
    field_bytes(5, &float_initializer("w", &[FLAT, 2], &weights), &mut graph);
    field_bytes(11, &value_info("image", &[1, 224, 224, 3]), &mut graph);
    field_bytes(12, &value_info("scores", &[1, 2]), &mut graph);

    let mut opset = Vec::new();
    field_varint(2, 13, &mut opset); // OperatorSetIdProto.version

    let mut model = Vec::new();
    field_varint(1, 8, &mut model); // ir_version
    field_bytes(7, &graph, &mut model);
    field_bytes(8, &opset, &mut model);
    model
}

// --- image fixtures ----------------------------------------------------------

pub fn png_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let img = image::ImageBuffer::from_pixel(width, height, image::Rgb(color));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

// --- stores ------------------------------------------------------------------

pub async fn install_artifacts(store: &dyn ObjectStore, labels: Option<&str>) {
    store
        .put(
            &format!("{ARTIFACT_PREFIX}/model.json"),
            Bytes::from_static(b"{\"format\":\"onnx\",\"input_shape\":[1,224,224,3]}"),
            "application/json",
        )
        .await
        .unwrap();
    store
        .put(
            &format!("{ARTIFACT_PREFIX}/weights.bin"),
            Bytes::from(tiny_model_onnx()),
            "application/octet-stream",
        )
        .await
        .unwrap();
    if let Some(labels) = labels {
        store
            .put(
                &format!("{ARTIFACT_PREFIX}/metadata.json"),
                Bytes::from(labels.as_bytes().to_vec()),
                "application/json",
            )
            .await
            .unwrap();
    }
}

/// Object store that counts `get` calls per key.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryObjectStore,
    gets: Mutex<HashMap<String, usize>>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gets(&self, key: &str) -> usize {
        *self.gets.lock().unwrap().get(key).unwrap_or(&0)
    }
}

#[async_trait]
impl ObjectStore for CountingStore {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StorageError> {
        self.inner.put(key, body, content_type).await
    }

    async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        *self.gets.lock().unwrap().entry(key.to_string()).or_insert(0) += 1;
        self.inner.get(key).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        self.inner.list(prefix).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.inner.delete(key).await
    }
}
