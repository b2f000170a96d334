mod test_bvh_basic;
mod test_camera_basic;
mod test_query_basic;
