pub mod playlist;
pub mod report;
pub mod track;
