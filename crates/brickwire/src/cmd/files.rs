use serde::Serialize;
use tracing::info;

use brickwire_codec::Command as Request;
use brickwire_device::actions::file;
use brickwire_device::FileEntry;

use crate::cmd::{brick_path, PathArgs, Session};
use crate::exit::{codec_error, device_error, CliResult, SUCCESS};
use crate::output::{print_record, print_rows, OutputFormat, Record};

impl Record for FileEntry {
    fn fields(&self) -> Vec<(&'static str, String)> {
        let (kind, size, md5) = match self {
            FileEntry::Directory { .. } => ("directory", String::new(), String::new()),
            FileEntry::File { size, md5, .. } => ("file", size.to_string(), md5.clone()),
        };
        vec![
            ("name", self.name().to_string()),
            ("kind", kind.to_string()),
            ("size", size),
            ("md5", md5),
        ]
    }
}

#[derive(Debug, Serialize)]
struct PathReport<'a> {
    path: &'a str,
    action: &'static str,
}

impl Record for PathReport<'_> {
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("path", self.path.to_string()),
            ("action", self.action.to_string()),
        ]
    }
}

pub fn run_mkdir(args: PathArgs, session: &Session, format: OutputFormat) -> CliResult<i32> {
    let path = brick_path(&args.path)?;
    if !session.is_live() {
        return session.preview(Request::system().add_component(file::create_dir(path)), format);
    }

    session
        .brick()
        .create_dir(path)
        .map_err(|err| device_error(&format!("mkdir {path} failed"), err))?;
    info!(path, "directory created");
    print_record(&PathReport { path, action: "created" }, format);
    Ok(SUCCESS)
}

pub fn run_rm(args: PathArgs, session: &Session, format: OutputFormat) -> CliResult<i32> {
    let path = brick_path(&args.path)?;
    if !session.is_live() {
        return session.preview(Request::system().add_component(file::delete_file(path)), format);
    }

    session
        .brick()
        .delete_file(path)
        .map_err(|err| device_error(&format!("rm {path} failed"), err))?;
    info!(path, "deleted");
    print_record(&PathReport { path, action: "deleted" }, format);
    Ok(SUCCESS)
}

pub fn run_ls(args: PathArgs, session: &Session, format: OutputFormat) -> CliResult<i32> {
    let path = brick_path(&args.path)?;
    if !session.is_live() {
        let component = file::list_files(path, file::MAX_CHUNK)
            .map_err(|err| codec_error("invalid listing request", err))?;
        return session.preview(Request::system().add_component(component), format);
    }

    let entries = session
        .brick()
        .list_files(path)
        .map_err(|err| device_error(&format!("ls {path} failed"), err))?;
    print_rows(&entries, format);
    Ok(SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_rows_share_one_header() {
        let dir = FileEntry::Directory {
            name: "prjs".to_string(),
        };
        let file = FileEntry::File {
            name: "a.rbf".to_string(),
            size: 0x1A,
            md5: "0123456789ABCDEF0123456789ABCDEF".to_string(),
        };
        let names = |entry: &FileEntry| -> Vec<&'static str> {
            entry.fields().into_iter().map(|(name, _)| name).collect()
        };
        assert_eq!(names(&dir), names(&file));
        assert_eq!(file.fields()[2].1, "26");
        assert_eq!(dir.fields()[1].1, "directory");
    }
}
