// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Filesystem driver adapter.
//!
//! The UI library reads images and fonts through a driver registered under a drive letter, such
//! as `S:`.  [`FsDriver`] is that driver for a platform that provides a C style file API, modelled
//! by the [`FileApi`] trait.  Every operation is forwarded as is, with the platform's negative
//! return codes turned into [`Error::Os`].
//!
//! Only file operations are provided.  Directory listing is not supported by the platform API.

use core::ffi::c_int;

use log::{debug, error};

use crate::error::{errno, to_result, to_result_void, Error, Result};
use crate::kconfig;

/// The file API of the platform.
///
/// Integer returns follow the C convention: negative values are errors.
pub trait FileApi {
    /// An open file.
    type File;

    /// Open the file at `path`, with C `fopen` style `flags` (`"r"`, `"w"` or `"r+"`).  Returns
    /// `None` if the file cannot be opened.
    fn fopen(&self, path: &str, flags: &str) -> Option<Self::File>;

    /// Close a file.
    fn fclose(&self, file: Self::File) -> c_int;

    /// Read up to `buf.len()` bytes, returning how many were read.
    fn fread(&self, buf: &mut [u8], file: &mut Self::File) -> c_int;

    /// Write `buf`, returning how many bytes were written.
    fn fwrite(&self, buf: &[u8], file: &mut Self::File) -> c_int;

    /// Move the file position.
    fn fseek(&self, file: &mut Self::File, offset: i64, whence: Whence) -> c_int;

    /// The current file position.
    fn ftell(&self, file: &mut Self::File) -> c_int;
}

/// How a file is opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenMode {
    /// Read only.
    Read,
    /// Write only.  The file is created, or truncated.
    Write,
    /// Read and write an existing file.
    ReadWrite,
}

impl OpenMode {
    /// The `fopen` flags for this mode.
    pub fn flags(self) -> &'static str {
        match self {
            OpenMode::Read => "r",
            OpenMode::Write => "w",
            OpenMode::ReadWrite => "r+",
        }
    }
}

/// The origin of a seek.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Whence {
    /// From the start of the file.
    Set,
    /// From the current position.
    Cur,
    /// From the end of the file.
    End,
}

/// A filesystem driver, forwarding to a platform [`FileApi`].
#[derive(Debug)]
pub struct FsDriver<F> {
    api: F,
    letter: char,
    cache_size: usize,
}

impl<F: FileApi> FsDriver<F> {
    /// A driver using the letter and cache size from Kconfig, `CONFIG_OSAL_FS_LETTER` and
    /// `CONFIG_OSAL_FS_CACHE_SIZE`.
    pub fn new(api: F) -> Result<FsDriver<F>> {
        let letter = kconfig::CONFIG_OSAL_FS_LETTER.chars().next().unwrap_or('\0');
        FsDriver::with_letter(api, letter, kconfig::CONFIG_OSAL_FS_CACHE_SIZE as usize)
    }

    /// A driver registered under `letter`, which must be an upper case ASCII letter.
    pub fn with_letter(api: F, letter: char, cache_size: usize) -> Result<FsDriver<F>> {
        if !letter.is_ascii_uppercase() {
            error!("fs letter {:?} must be an upper case ASCII letter", letter);
            return Err(Error::Os(errno::EINVAL));
        }
        Ok(FsDriver {
            api,
            letter,
            cache_size,
        })
    }

    /// The drive letter.
    pub fn letter(&self) -> char {
        self.letter
    }

    /// Size of the read cache the UI library should keep for each file, 0 for none.
    pub fn cache_size(&self) -> usize {
        self.cache_size
    }

    /// The platform file API.
    pub fn api(&self) -> &F {
        &self.api
    }

    // Drop a leading "S:", if the path still has it.
    fn local_path<'a>(&self, path: &'a str) -> &'a str {
        path.strip_prefix(self.letter)
            .and_then(|rest| rest.strip_prefix(':'))
            .unwrap_or(path)
    }

    /// Open a file.
    pub fn open(&self, path: &str, mode: OpenMode) -> Result<F::File> {
        let path = self.local_path(path);
        debug!("fs open {:?} {:?}", path, mode);
        self.api
            .fopen(path, mode.flags())
            .ok_or(Error::Os(errno::ENOENT))
    }

    /// Close a file.
    pub fn close(&self, file: F::File) -> Result<()> {
        to_result_void(self.api.fclose(file))
    }

    /// Read into `buf`, returning the number of bytes read.
    pub fn read(&self, file: &mut F::File, buf: &mut [u8]) -> Result<usize> {
        to_result(self.api.fread(buf, file)).map(|n| n as usize)
    }

    /// Write `buf`, returning the number of bytes written.
    pub fn write(&self, file: &mut F::File, buf: &[u8]) -> Result<usize> {
        to_result(self.api.fwrite(buf, file)).map(|n| n as usize)
    }

    /// Move the file position to `pos`, relative to `whence`.
    pub fn seek(&self, file: &mut F::File, pos: u32, whence: Whence) -> Result<()> {
        to_result_void(self.api.fseek(file, pos.into(), whence))
    }

    /// The current file position.
    pub fn tell(&self, file: &mut F::File) -> Result<u32> {
        to_result(self.api.ftell(file)).map(|pos| pos as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    /// Files kept in memory.
    #[derive(Debug, Default)]
    struct MemFs {
        files: RefCell<BTreeMap<String, Vec<u8>>>,
        opened: RefCell<Vec<String>>,
    }

    struct MemFile {
        name: String,
        pos: usize,
        writable: bool,
    }

    impl FileApi for MemFs {
        type File = MemFile;

        fn fopen(&self, path: &str, flags: &str) -> Option<MemFile> {
            self.opened.borrow_mut().push(path.to_string());
            let mut files = self.files.borrow_mut();
            match flags {
                "w" => {
                    files.insert(path.to_string(), Vec::new());
                }
                "r" | "r+" if files.contains_key(path) => (),
                _ => return None,
            }
            Some(MemFile {
                name: path.to_string(),
                pos: 0,
                writable: flags != "r",
            })
        }

        fn fclose(&self, _file: MemFile) -> c_int {
            0
        }

        fn fread(&self, buf: &mut [u8], file: &mut MemFile) -> c_int {
            let files = self.files.borrow();
            let data = &files[&file.name];
            let start = file.pos.min(data.len());
            let count = buf.len().min(data.len() - start);
            buf[..count].copy_from_slice(&data[start..start + count]);
            file.pos += count;
            count as c_int
        }

        fn fwrite(&self, buf: &[u8], file: &mut MemFile) -> c_int {
            if !file.writable {
                return -(errno::EPERM as c_int);
            }
            let mut files = self.files.borrow_mut();
            let data = files.get_mut(&file.name).unwrap();
            let end = file.pos + buf.len();
            if data.len() < end {
                data.resize(end, 0);
            }
            data[file.pos..end].copy_from_slice(buf);
            file.pos = end;
            buf.len() as c_int
        }

        fn fseek(&self, file: &mut MemFile, offset: i64, whence: Whence) -> c_int {
            let len = self.files.borrow()[&file.name].len() as i64;
            let base = match whence {
                Whence::Set => 0,
                Whence::Cur => file.pos as i64,
                Whence::End => len,
            };
            let pos = base + offset;
            if pos < 0 {
                return -(errno::EINVAL as c_int);
            }
            file.pos = pos as usize;
            0
        }

        fn ftell(&self, file: &mut MemFile) -> c_int {
            file.pos as c_int
        }
    }

    #[test]
    fn open_modes() {
        assert_eq!(OpenMode::Read.flags(), "r");
        assert_eq!(OpenMode::Write.flags(), "w");
        assert_eq!(OpenMode::ReadWrite.flags(), "r+");
    }

    #[test]
    fn letter_from_config() {
        let driver = FsDriver::new(MemFs::default()).unwrap();
        assert!(driver.letter().is_ascii_uppercase());
        assert_eq!(driver.cache_size(), kconfig::CONFIG_OSAL_FS_CACHE_SIZE as usize);
        assert_eq!(
            FsDriver::with_letter(MemFs::default(), 's', 0).unwrap_err(),
            Error::Os(errno::EINVAL)
        );
    }

    #[test]
    fn write_then_read_back() {
        let driver = FsDriver::with_letter(MemFs::default(), 'S', 0).unwrap();
        assert_eq!(
            driver.open("S:/img.bin", OpenMode::Read).err(),
            Some(Error::Os(errno::ENOENT))
        );

        let mut file = driver.open("S:/img.bin", OpenMode::Write).unwrap();
        assert_eq!(driver.write(&mut file, b"hello world"), Ok(11));
        assert_eq!(driver.tell(&mut file), Ok(11));
        driver.close(file).unwrap();

        let mut file = driver.open("/img.bin", OpenMode::Read).unwrap();
        driver.seek(&mut file, 6, Whence::Set).unwrap();
        let mut buf = [0u8; 16];
        assert_eq!(driver.read(&mut file, &mut buf), Ok(5));
        assert_eq!(&buf[..5], b"world");
        assert_eq!(driver.read(&mut file, &mut buf), Ok(0));
        // Read only files reject writes, with the platform's code.
        assert_eq!(driver.write(&mut file, b"x"), Err(Error::Os(errno::EPERM)));
        driver.close(file).unwrap();

        // The drive prefix never reaches the platform.
        assert_eq!(*driver.api().opened.borrow(), vec!["/img.bin"; 3]);
    }

    #[test]
    fn read_write_in_place() {
        let driver = FsDriver::with_letter(MemFs::default(), 'S', 0).unwrap();
        let mut file = driver.open("S:/cfg", OpenMode::Write).unwrap();
        driver.write(&mut file, b"abcdef").unwrap();
        driver.close(file).unwrap();

        let mut file = driver.open("S:/cfg", OpenMode::ReadWrite).unwrap();
        driver.seek(&mut file, 2, Whence::End).unwrap();
        assert_eq!(driver.tell(&mut file), Ok(8));
        driver.seek(&mut file, 1, Whence::Set).unwrap();
        driver.seek(&mut file, 1, Whence::Cur).unwrap();
        driver.write(&mut file, b"XY").unwrap();
        driver.seek(&mut file, 0, Whence::Set).unwrap();
        let mut buf = [0u8; 6];
        driver.read(&mut file, &mut buf).unwrap();
        assert_eq!(&buf, b"abXYef");
        driver.close(file).unwrap();
    }
}
