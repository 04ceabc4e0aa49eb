//! PDF to PNG page rasterization through `pdftoppm`.

use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{info, instrument};

use crate::tool::{run_with_deadline, truncate_chars, ScratchSpace, ToolCommand};
use crate::ConvertError;

pub const DEFAULT_DPI: u32 = 200;
pub const DEFAULT_MAX_PAGES: u32 = 20;
pub const MAX_DPI: u32 = 1200;
pub const DEFAULT_RASTER_TIMEOUT: Duration = Duration::from_secs(120);

const PAGE_PREFIX: &str = "page";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterOptions {
    pub dpi: u32,
    pub max_pages: u32,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl RasterOptions {
    pub fn validate(&self) -> Result<(), ConvertError> {
        if self.dpi == 0 || self.dpi > MAX_DPI {
            return Err(ConvertError::invalid_option(format!(
                "dpi must be between 1 and {MAX_DPI}, got {}",
                self.dpi
            )));
        }
        if self.max_pages == 0 {
            return Err(ConvertError::invalid_option(
                "max_pages must be at least 1",
            ));
        }
        Ok(())
    }
}

/// One rendered page, numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    pub page: u32,
    pub png: Vec<u8>,
}

impl PageImage {
    pub fn to_data_url(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.png))
    }
}

#[derive(Debug, Clone)]
pub struct PdfRasterizer {
    tool: ToolCommand,
    deadline: Duration,
    scratch: ScratchSpace,
}

impl PdfRasterizer {
    pub fn new(tool: ToolCommand, scratch: ScratchSpace) -> Self {
        Self {
            tool,
            deadline: DEFAULT_RASTER_TIMEOUT,
            scratch,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Render the first `max_pages` pages of `pdf`, in page order.
    #[instrument(skip(self, pdf), fields(bytes = pdf.len(), dpi = options.dpi, max_pages = options.max_pages))]
    pub async fn rasterize(
        &self,
        pdf: &[u8],
        options: RasterOptions,
    ) -> Result<Vec<PageImage>, ConvertError> {
        options.validate()?;
        let workdir = self.scratch.create("etude-raster-")?;
        let input = workdir.path().join("input.pdf");
        tokio::fs::write(&input, pdf).await?;

        let dpi = options.dpi.to_string();
        let last = options.max_pages.to_string();
        let prefix = workdir.path().join(PAGE_PREFIX);
        let args = [
            OsStr::new("-png"),
            OsStr::new("-r"),
            OsStr::new(&dpi),
            OsStr::new("-f"),
            OsStr::new("1"),
            OsStr::new("-l"),
            OsStr::new(&last),
            input.as_os_str(),
            prefix.as_os_str(),
        ];
        let output = run_with_deadline(&self.tool, args, self.deadline).await?;
        if !output.status.success() {
            return Err(ConvertError::ToolFailed {
                program: self.tool.display_name(),
                status: output.status.to_string(),
                stderr: truncate_chars(output.stderr.trim(), 1000),
            });
        }

        let pages = collect_pages(workdir.path())?;
        info!(pages = pages.len(), "rasterized pdf");
        Ok(pages)
    }
}

fn collect_pages(dir: &Path) -> Result<Vec<PageImage>, ConvertError> {
    let mut pages = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(page) = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(page_number)
        else {
            continue;
        };
        pages.push(PageImage {
            page,
            png: fs::read(&path)?,
        });
    }
    pages.sort_by_key(|image| image.page);
    Ok(pages)
}

/// `page-7.png` and `page-07.png` both give 7.
fn page_number(file_name: &str) -> Option<u32> {
    file_name
        .strip_prefix(PAGE_PREFIX)?
        .strip_prefix('-')?
        .strip_suffix(".png")?
        .parse()
        .ok()
}
