//! PDF rasterisation via pdfium, for the OCR strategy.
//!
//! pdfium is a C++ library with thread-local state, so rendering is only
//! ever called from a `spawn_blocking` thread (see [`crate::pipeline::ocr`]).
//! The library is bound at runtime: a machine without libpdfium simply has
//! no rasterizer and the OCR strategy is skipped.

use crate::capabilities::Rasterizer;
use crate::error::{PageError, StrategyError};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming the libpdfium file or the directory holding it.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Page rasterizer backed by a dynamically bound libpdfium.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRasterizer {
    library: Option<PathBuf>,
}

impl PdfiumRasterizer {
    /// Use an explicit library file or directory instead of the search order.
    pub fn with_library(path: impl Into<PathBuf>) -> Self {
        Self {
            library: Some(path.into()),
        }
    }

    /// Check that libpdfium can be bound, honouring `PDFIUM_LIB_PATH`.
    pub fn probe() -> Result<Self, String> {
        let rasterizer = Self {
            library: std::env::var_os(PDFIUM_LIB_PATH_ENV).map(PathBuf::from),
        };
        rasterizer.bind()?;
        Ok(rasterizer)
    }

    /// Bind the library.
    ///
    /// Search order without an explicit path: `./`, then system paths.
    fn bind(&self) -> Result<Pdfium, String> {
        let bindings = match self.library {
            Some(ref p) if p.is_dir() => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(p))
            }
            Some(ref p) => Pdfium::bind_to_library(p),
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| format!("failed to load libpdfium: {:?}", e))?;

        Ok(Pdfium::new(bindings))
    }
}

impl Rasterizer for PdfiumRasterizer {
    fn name(&self) -> &str {
        "pdfium"
    }

    fn rasterize(
        &self,
        path: &Path,
        zoom: f32,
        on_page: &mut dyn FnMut(usize, usize, Result<DynamicImage, PageError>),
    ) -> Result<usize, StrategyError> {
        let pdfium = self
            .bind()
            .map_err(|detail| StrategyError::Unreadable { detail })?;

        let document = pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| StrategyError::Unreadable {
                detail: format!("{:?}", e),
            })?;

        let pages = document.pages();
        let total_pages = pages.len() as usize;
        info!("PDF loaded for OCR: {} pages", total_pages);

        // Scale relative to pdfium's 72-dpi page size.
        let render_config = PdfRenderConfig::new().scale_page_by_factor(zoom);

        for (idx, page) in pages.iter().enumerate() {
            let page_num = idx + 1;
            let image = page
                .render_with_config(&render_config)
                .map(|bitmap| bitmap.as_image())
                .map_err(|e| PageError::RenderFailed {
                    page: page_num,
                    detail: format!("{:?}", e),
                });

            if let Ok(ref img) = image {
                debug!("Rendered page {} → {}x{} px", page_num, img.width(), img.height());
            }
            on_page(page_num, total_pages, image);
        }

        Ok(total_pages)
    }
}
