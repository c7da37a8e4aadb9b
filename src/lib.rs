pub mod geoplot_core;
