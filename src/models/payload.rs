//! 图片负载
//!
//! 由文档摄取服务产出的图片，对本系统而言只是"字节 + MIME"。

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use phf::phf_map;
use std::path::Path;
use std::sync::Arc;

use crate::error::{AnalysisError, AnalysisResult};

/// 按扩展名推断的图片 MIME 类型
static IMAGE_MIME_TYPES: phf::Map<&'static str, &'static str> = phf_map! {
    "png" => "image/png",
    "jpg" => "image/jpeg",
    "jpeg" => "image/jpeg",
    "webp" => "image/webp",
    "gif" => "image/gif",
    "heic" => "image/heic",
    "heif" => "image/heif",
};

/// 图片负载（只读，克隆开销很小）
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    data: Arc<[u8]>,
    mime_type: String,
}

impl ImagePayload {
    pub fn new(data: impl Into<Arc<[u8]>>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    /// 从磁盘读取图片
    ///
    /// 只接受已经栅格化的图片；PDF 等文档需要先经过文档摄取服务转换。
    pub async fn from_path(path: &Path) -> AnalysisResult<Self> {
        let mime_type = mime_for_path(path)?;
        let data = tokio::fs::read(path).await.map_err(|e| {
            AnalysisError::Input(format!("无法读取图片 {}: {}", path.display(), e))
        })?;

        if data.is_empty() {
            return Err(AnalysisError::Input(format!(
                "图片文件为空: {}",
                path.display()
            )));
        }

        Ok(Self::new(data, mime_type))
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Base64 编码后的内容
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }

    /// `data:` URL，用于 OpenAI 兼容接口
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}

impl std::fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePayload")
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

fn mime_for_path(path: &Path) -> AnalysisResult<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if ext == "pdf" {
        return Err(AnalysisError::Input(format!(
            "{} 是 PDF 文件，请先转换为图片后再分析",
            path.display()
        )));
    }

    IMAGE_MIME_TYPES.get(ext.as_str()).copied().ok_or_else(|| {
        AnalysisError::Input(format!("不支持的图片格式: {}", path.display()))
    })
}
