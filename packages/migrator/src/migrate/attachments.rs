//! Attachments of one post: copy the binary, register it with the upload
//! subsystem, splice the rendered preview into the post.

use tracing::warn;

use super::assets::attachment_source;
use super::context::RunContext;
use super::id_map::EntityKind;
use crate::error::MigrateError;
use crate::store::NewUpload;

pub(crate) async fn migrate_post_attachments(
    ctx: &mut RunContext,
    source_post_id: i64,
    post_id: i64,
) -> Result<(), MigrateError> {
    // Without the upload subsystem there is nowhere to register files
    let Some(registry) = ctx.uploads.clone() else {
        return Ok(());
    };

    let rows = ctx.source.post_attachments(source_post_id).await?;
    let store = ctx.store.clone();

    for row in rows {
        let base_name = sanitize_filename(&row.filename);
        let src = attachment_source(&ctx.legacy_root, &row.attachname);
        let dest_rel = format!("old/{}{}", source_post_id, base_name);

        // Copy first; a file that cannot be copied is skipped and the
        // owning post is unaffected
        if let Err(err) = ctx.assets.store_upload(&src, &dest_rel) {
            warn!(post_id, file = %row.filename, error = %err, "skipping attachment");
            continue;
        }

        let upload = NewUpload {
            actor_id: ctx.ids.lookup(EntityKind::User, row.uid),
            post_id,
            base_name,
            url: ctx.assets.upload_url(&dest_rel),
            path: dest_rel,
            mime: row.filetype,
            size: row.filesize,
        };

        match registry.register(upload).await {
            Ok(preview) => {
                match store.append_post_content(post_id, &format!(" {preview}")).await {
                    Ok(()) => {}
                    Err(err) if err.is_fatal() => return Err(err.into()),
                    Err(err) => warn!(post_id, error = %err, "preview not appended"),
                }
                ctx.counts.attachments += 1;
            }
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => warn!(post_id, error = %err, "skipping unregistered attachment"),
        }
    }

    Ok(())
}

/// Make a legacy file name safe as a storage path component: accents and
/// parentheses stripped, spaces turned into underscores.
pub(crate) fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter_map(|c| match c {
            '(' | ')' => None,
            ' ' => Some('_'),
            _ => Some(fold_accent(c)),
        })
        .collect()
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' => 'O',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ý' | 'ÿ' => 'y',
        'Ý' => 'Y',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ç' => 'c',
        'Ç' => 'C',
        'ß' => 's',
        _ => c,
    }
}
