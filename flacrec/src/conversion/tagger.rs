//! Tag and cover art writing using lofty
//!
//! FLAC files get Vorbis comments; pictures become FLAC PICTURE blocks.

use crate::error::{Error, Result};
use lofty::config::WriteOptions;
use lofty::file::{TaggedFile, TaggedFileExt};
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::Tag;
use std::path::Path;
use tracing::debug;

/// Text tags written to each recording
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackTags {
    pub artist: String,
    pub title: String,
    /// Empty = no album tag
    pub album: String,
}

/// Write artist/title/album, replacing any existing values
pub fn write_tags(path: &Path, tags: &TrackTags) -> Result<()> {
    let mut tagged_file = read_file(path)?;
    let tag = primary_tag_mut(&mut tagged_file, path)?;

    if tags.artist.is_empty() {
        tag.remove_artist();
    } else {
        tag.set_artist(tags.artist.clone());
    }

    if tags.title.is_empty() {
        tag.remove_title();
    } else {
        tag.set_title(tags.title.clone());
    }

    if tags.album.is_empty() {
        tag.remove_album();
    } else {
        tag.set_album(tags.album.clone());
    }

    save(tag, path)?;

    debug!(
        file = %path.display(),
        artist = %tags.artist,
        title = %tags.title,
        album = %tags.album,
        "Wrote tags"
    );
    Ok(())
}

/// Embed `data` as the front cover, replacing any existing front cover
pub fn embed_cover(path: &Path, data: Vec<u8>, mime_type: &str) -> Result<()> {
    let mut tagged_file = read_file(path)?;
    let tag = primary_tag_mut(&mut tagged_file, path)?;

    let size = data.len();
    let picture = Picture::new_unchecked(
        PictureType::CoverFront,
        Some(mime_from_str(mime_type)),
        None,
        data,
    );
    tag.remove_picture_type(PictureType::CoverFront);
    tag.push_picture(picture);

    save(tag, path)?;

    debug!(file = %path.display(), bytes = size, mime = mime_type, "Embedded cover art");
    Ok(())
}

fn read_file(path: &Path) -> Result<TaggedFile> {
    Probe::open(path)
        .and_then(|probe| probe.read())
        .map_err(|e| Error::Tagging {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn primary_tag_mut<'a>(tagged_file: &'a mut TaggedFile, path: &Path) -> Result<&'a mut Tag> {
    if tagged_file.primary_tag().is_none() {
        let tag_type = tagged_file.primary_tag_type();
        tagged_file.insert_tag(Tag::new(tag_type));
    }

    tagged_file.primary_tag_mut().ok_or_else(|| Error::Tagging {
        path: path.to_path_buf(),
        reason: "file format does not support tags".to_string(),
    })
}

fn save(tag: &Tag, path: &Path) -> Result<()> {
    tag.save_to_path(path, WriteOptions::default())
        .map_err(|e| Error::Tagging {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn mime_from_str(mime_type: &str) -> MimeType {
    match mime_type {
        "image/jpeg" => MimeType::Jpeg,
        "image/png" => MimeType::Png,
        "image/gif" => MimeType::Gif,
        "image/bmp" => MimeType::Bmp,
        "image/tiff" => MimeType::Tiff,
        other => MimeType::Unknown(other.to_string()),
    }
}
