//! JSON bodies exchanged with the gallery REST API.

use serde::{Deserialize, Serialize};

use crate::{op::EditOp, types::ImageId};

/// Body of `POST api/edit/preview_chain/`.
#[derive(Debug, Serialize)]
pub struct PreviewChainBody<'a> {
    /// Source image to render against.
    pub image_id: ImageId,
    /// Full chain as wire tokens, applied left-to-right.
    pub edits: &'a [EditOp],
}

/// Body of the single-image edit endpoints (colorize, stickers).
#[derive(Debug, Serialize)]
pub struct ImageIdBody {
    /// Target image.
    pub image_id: ImageId,
}

/// Body of `POST api/images/copy/`.
#[derive(Debug, Serialize)]
pub struct CopyBody {
    /// Image the copy derives from.
    pub original_id: ImageId,
}

/// Preview and colorize responses carry the rendered artifact URL.
#[derive(Debug, Deserialize)]
pub struct EditedResponse {
    /// URL of the rendered artifact.
    pub edited: String,
}

/// Sticker endpoints answer with a dedicated URL field.
#[derive(Debug, Deserialize)]
pub struct StickerResponse {
    /// URL of the rendered sticker.
    pub sticker_url: String,
}

/// `POST api/images/copy/` answers with the new image identity.
#[derive(Debug, Deserialize)]
pub struct CopyResponse {
    /// Identity of the created copy.
    pub id: ImageId,
}
