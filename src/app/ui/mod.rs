mod panels;
mod timeline;
mod windows;
