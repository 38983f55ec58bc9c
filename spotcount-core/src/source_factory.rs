use crate::backend::tiff_source::TiffSource;
use crate::image::ImageSource;

pub enum SourceBackend {
    Tiff,
}

pub fn open_source(backend: SourceBackend) -> Box<dyn ImageSource> {
    match backend {
        SourceBackend::Tiff => Box::new(TiffSource::default()),
    }
}
